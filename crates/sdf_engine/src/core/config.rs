//! Simulation configuration
//!
//! TOML-backed settings for the sandbox applications: world extents,
//! field resolution, particle population, and response tuning. Every
//! section and field is optional; missing values fall back to defaults,
//! so a config file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::Aabb;

/// Errors produced while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Underlying file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML content failed to parse
    #[error("Parse error: {0}")]
    Parse(String),
    /// Configuration failed to serialize
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// World box settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half-extents of the world box, centered on the origin
    pub half_extents: [f32; 3],
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_extents: [5.0, 5.0, 5.0],
        }
    }
}

/// Distance field baking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdfConfig {
    /// Samples per axis of the baked grid
    pub resolution: usize,
}

impl Default for SdfConfig {
    fn default() -> Self {
        Self { resolution: 32 }
    }
}

/// Particle population settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Number of particles to scatter
    pub count: usize,
    /// Initial speed of every particle
    pub speed: f32,
    /// Render size and collision radius
    pub size: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 200,
            speed: 2.0,
            size: 0.05,
        }
    }
}

/// Stepping and response settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed frame delta in seconds
    pub timestep: f32,
    /// Restitution for particle-body impulses
    pub particle_restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            particle_restitution: 1.0,
        }
    }
}

/// Top-level simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World box settings
    pub world: WorldConfig,
    /// Distance field settings
    pub sdf: SdfConfig,
    /// Particle settings
    pub particles: ParticleConfig,
    /// Stepping and response settings
    pub physics: PhysicsConfig,
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration as TOML
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The configured world box as an [`Aabb`]
    pub fn world_bounds(&self) -> Aabb {
        let half = Vec3::new(
            self.world.half_extents[0],
            self.world.half_extents[1],
            self.world.half_extents[2],
        );
        Aabb::new(-half, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.sdf.resolution, 32);
        assert_eq!(config.particles.count, 200);
        assert_relative_eq!(config.physics.timestep, 1.0 / 60.0);
        assert_relative_eq!(config.world_bounds().max, Vec3::repeat(5.0));
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: SimulationConfig = toml::from_str(
            "[world]\n\
             half_extents = [3.0, 2.0, 4.0]\n\
             \n\
             [particles]\n\
             count = 50\n",
        )
        .unwrap();

        assert_relative_eq!(config.world_bounds().min, Vec3::new(-3.0, -2.0, -4.0));
        assert_eq!(config.particles.count, 50);
        // Untouched sections keep their defaults
        assert_eq!(config.sdf.resolution, 32);
        assert_relative_eq!(config.particles.speed, 2.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SimulationConfig::default();
        config.sdf.resolution = 16;
        config.physics.particle_restitution = 0.9;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SimulationConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.sdf.resolution, 16);
        assert_relative_eq!(parsed.physics.particle_restitution, 0.9);
    }

    #[test]
    fn test_missing_file() {
        let result = SimulationConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
