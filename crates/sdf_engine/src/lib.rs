//! # SDF Engine
//!
//! A signed-distance-field collision engine: triangle meshes are baked
//! into dense distance grids, placed in the world as collision objects,
//! and stepped against each other and a particle population once per
//! frame.
//!
//! ## Features
//!
//! - **BVH Spatial Index**: Median-split bounding volume hierarchy for
//!   closest-distance and ray-parity queries over triangle soups
//! - **Distance Field Baking**: Padded dense grids with trilinear
//!   sampling and central-difference gradients
//! - **Collision Objects**: Mesh + field + transform with lazy matrix
//!   caching and inverse-mass dynamics
//! - **Particles**: Point masses colliding against walls and fields
//! - **Deterministic Pipeline**: Fixed per-frame ordering of integration,
//!   containment, and response
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdf_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mesh = ObjLoader::load_collision_mesh("assets/rock.obj")?;
//!     let object = CollisionObject::from_mesh(mesh, 32);
//!
//!     let bounds = Aabb::new(Vec3::repeat(-5.0), Vec3::repeat(5.0));
//!     let mut simulation = Simulation::new(bounds);
//!     simulation.insert_object(object);
//!     simulation.initialize_particles(200, 2.0, 0.05);
//!
//!     loop {
//!         simulation.update(1.0 / 60.0);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod core;

pub mod assets;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{ObjError, ObjLoader},
        core::{ConfigError, SimulationConfig},
        foundation::math::{Mat4, Transform, Vec3},
        physics::{
            Aabb, CollisionMesh, CollisionObject, ObjectKey, Particle, ParticleSystem, Ray,
            SignedDistanceField, Simulation, Triangle,
        },
        spatial::Bvh,
    };
}
