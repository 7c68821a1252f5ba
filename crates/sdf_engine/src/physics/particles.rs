//! Point-mass particles and their bulk container
//!
//! Particles carry no field data of their own; they are pure kinematic
//! point masses that the simulation orchestrator integrates and collides
//! against walls and distance fields.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::Aabb;

/// Default render size (collision radius) for new particles
pub const DEFAULT_PARTICLE_SIZE: f32 = 0.05;

/// Default particle mass
pub const DEFAULT_PARTICLE_MASS: f32 = 1.0;

/// A single point mass
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// World-space position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Render size, also used as the collision radius
    pub size: f32,
    mass: f32,
    inverse_mass: f32,
}

impl Particle {
    /// Create a particle with the given state
    pub fn new(position: Vec3, velocity: Vec3, size: f32, mass: f32) -> Self {
        let mut particle = Self {
            position,
            velocity,
            size,
            mass: 0.0,
            inverse_mass: 0.0,
        };
        particle.set_mass(mass);
        particle
    }

    /// Euler position integration
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Particle mass (non-positive means immovable)
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Cached reciprocal mass (0 encodes infinite mass)
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Set the mass, refreshing the cached inverse
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(
            Vec3::zeros(),
            Vec3::zeros(),
            DEFAULT_PARTICLE_SIZE,
            DEFAULT_PARTICLE_MASS,
        )
    }
}

/// Bulk particle container, created and re-initialized as a whole
///
/// Individual particles are never destroyed; re-initialization replaces the
/// entire population.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    count: usize,
    rng: StdRng,
}

impl ParticleSystem {
    /// Create a system that will hold `count` particles once initialized
    pub fn new(count: usize) -> Self {
        Self {
            particles: Vec::with_capacity(count),
            count,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a system with a deterministic random sequence
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(count),
            count,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Scatter the full population uniformly inside `bounds` with random
    /// directions at the given speed
    pub fn initialize(&mut self, bounds: &Aabb, speed: f32, size: f32) {
        self.particles.clear();
        self.particles.reserve(self.count);

        for _ in 0..self.count {
            let position = self.random_position(bounds);
            let velocity = self.random_direction() * speed;
            self.particles
                .push(Particle::new(position, velocity, size, DEFAULT_PARTICLE_MASS));
        }
    }

    /// Euler step for the whole population
    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.integrate(dt);
        }
    }

    /// Read-only view of the population
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view for the collision orchestrator
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of live particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True before initialization or for a zero-count system
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Set the render size of every particle
    pub fn set_particle_size(&mut self, size: f32) {
        for particle in &mut self.particles {
            particle.size = size;
        }
    }

    fn random_position(&mut self, bounds: &Aabb) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(bounds.min.x..=bounds.max.x),
            self.rng.gen_range(bounds.min.y..=bounds.max.y),
            self.rng.gen_range(bounds.min.z..=bounds.max.z),
        )
    }

    /// Rejection-sample a direction inside the unit ball (length clamped
    /// away from zero), then normalize
    fn random_direction(&mut self) -> Vec3 {
        loop {
            let candidate = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            let len = candidate.norm();
            if len > 0.1 && len <= 1.0 {
                return candidate / len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initialize_inside_bounds() {
        let bounds = Aabb::new(Vec3::new(-2.0, -1.0, -3.0), Vec3::new(2.0, 1.0, 3.0));
        let mut system = ParticleSystem::with_seed(100, 1);
        system.initialize(&bounds, 2.0, 0.05);

        assert_eq!(system.len(), 100);
        for particle in system.particles() {
            assert!(bounds.contains_point(particle.position));
            assert_relative_eq!(particle.velocity.norm(), 2.0, epsilon = 1e-4);
            assert_relative_eq!(particle.size, 0.05);
        }
    }

    #[test]
    fn test_reinitialize_replaces_population() {
        let bounds = Aabb::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        let mut system = ParticleSystem::with_seed(10, 2);

        system.initialize(&bounds, 1.0, 0.05);
        let first: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();

        system.initialize(&bounds, 1.0, 0.05);
        assert_eq!(system.len(), 10);
        let second: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_integration() {
        let mut particle = Particle::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            0.05,
            1.0,
        );
        particle.integrate(0.25);
        assert_relative_eq!(particle.position, Vec3::new(1.0, 0.5, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_mass_inverse_caching() {
        let mut particle = Particle::default();
        assert_relative_eq!(particle.inverse_mass(), 1.0);

        particle.set_mass(4.0);
        assert_relative_eq!(particle.inverse_mass(), 0.25);

        particle.set_mass(0.0);
        assert_eq!(particle.inverse_mass(), 0.0);
    }
}
