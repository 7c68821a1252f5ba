//! Particle sandbox
//!
//! Headless demo: scatters a particle population around two box
//! obstacles (one static, one drifting) and steps the simulation at a
//! fixed timestep, logging population statistics as it runs. Pass a
//! TOML config path as the first argument to override the defaults.

use std::env;
use std::error::Error;

use log::info;

use sdf_engine::prelude::*;

const FRAMES: usize = 600;
const REPORT_INTERVAL: usize = 60;

fn kinetic_energy(simulation: &Simulation) -> f32 {
    let particles: f32 = simulation
        .particles()
        .iter()
        .map(|p| 0.5 * p.mass() * p.velocity.norm_squared())
        .sum();
    let objects: f32 = simulation
        .objects()
        .map(|(_, o)| 0.5 * o.mass() * o.velocity().norm_squared())
        .sum();
    particles + objects
}

fn main() -> Result<(), Box<dyn Error>> {
    sdf_engine::foundation::logging::init();

    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };

    let bounds = config.world_bounds();
    let mut simulation = Simulation::new(bounds);
    simulation.set_particle_restitution(config.physics.particle_restitution);

    // A static obstacle in the middle of the world
    let anchor_mesh = CollisionMesh::cuboid(Vec3::new(1.0, 1.0, 1.0));
    let mut anchor = CollisionObject::from_mesh(anchor_mesh, config.sdf.resolution);
    anchor.set_mass(0.0);
    simulation.insert_object(anchor);

    // A lighter box drifting through the particle cloud
    let drifter_mesh = CollisionMesh::cuboid(Vec3::new(0.5, 0.5, 0.5));
    let mut drifter = CollisionObject::from_mesh(drifter_mesh, config.sdf.resolution);
    drifter.set_position(Vec3::new(
        bounds.min.x + 1.0,
        0.0,
        0.0,
    ));
    drifter.set_velocity(Vec3::new(1.5, 0.4, -0.3));
    simulation.insert_object(drifter);

    simulation.initialize_particles(
        config.particles.count,
        config.particles.speed,
        config.particles.size,
    );

    info!(
        "Particle sandbox: {} particles, {} objects, bounds {:?} to {:?}",
        simulation.particles().len(),
        simulation.object_count(),
        bounds.min,
        bounds.max
    );

    let dt = config.physics.timestep;
    for frame in 0..FRAMES {
        simulation.update(dt);

        if frame % REPORT_INTERVAL == 0 {
            let contained = simulation
                .particles()
                .iter()
                .filter(|p| bounds.contains_point(p.position))
                .count();
            info!(
                "frame {:4}  t={:6.2}s  contained {}/{}  energy {:.3}",
                frame,
                frame as f32 * dt,
                contained,
                simulation.particles().len(),
                kinetic_energy(&simulation)
            );
        }
    }

    info!("Done: final energy {:.3}", kinetic_energy(&simulation));
    Ok(())
}
