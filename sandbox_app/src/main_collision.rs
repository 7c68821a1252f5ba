//! Collision sandbox
//!
//! Headless demo: a handful of dynamic boxes with random velocities
//! bounce around the world box and off each other, with a heavy static
//! block in the center. Logs total momentum each second so drift in the
//! response math is visible. Pass a TOML config path as the first
//! argument to override the defaults.

use std::env;
use std::error::Error;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sdf_engine::prelude::*;

const FRAMES: usize = 600;
const REPORT_INTERVAL: usize = 60;
const BODY_COUNT: usize = 6;

fn total_momentum(simulation: &Simulation) -> Vec3 {
    simulation
        .objects()
        .map(|(_, o)| o.velocity() * o.mass())
        .sum()
}

fn main() -> Result<(), Box<dyn Error>> {
    sdf_engine::foundation::logging::init();

    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };

    let bounds = config.world_bounds();
    let mut simulation = Simulation::new(bounds);

    // Heavy static block in the center
    let block_mesh = CollisionMesh::cuboid(Vec3::new(1.2, 1.2, 1.2));
    let mut block = CollisionObject::from_mesh(block_mesh, config.sdf.resolution);
    block.set_mass(0.0);
    simulation.insert_object(block);

    // Dynamic boxes scattered around it
    let mut rng = StdRng::seed_from_u64(17);
    for i in 0..BODY_COUNT {
        let mesh = CollisionMesh::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let mut object = CollisionObject::from_mesh(mesh, config.sdf.resolution);

        let angle = i as f32 / BODY_COUNT as f32 * std::f32::consts::TAU;
        let ring = (bounds.max.x - 1.5).min(3.0);
        object.set_position(Vec3::new(ring * angle.cos(), 0.0, ring * angle.sin()));
        object.set_velocity(Vec3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-2.0..2.0),
        ));
        simulation.insert_object(object);
    }

    info!(
        "Collision sandbox: {} objects, bounds {:?} to {:?}",
        simulation.object_count(),
        bounds.min,
        bounds.max
    );

    let dt = config.physics.timestep;
    for frame in 0..FRAMES {
        simulation.update(dt);

        if frame % REPORT_INTERVAL == 0 {
            let momentum = total_momentum(&simulation);
            info!(
                "frame {:4}  t={:6.2}s  momentum ({:7.3}, {:7.3}, {:7.3})",
                frame,
                frame as f32 * dt,
                momentum.x,
                momentum.y,
                momentum.z
            );
        }
    }

    for (key, object) in simulation.objects() {
        info!(
            "object {:?}: position {:?} velocity {:?}",
            key,
            object.position(),
            object.velocity()
        );
    }

    Ok(())
}
