//! Physics: collision geometry, distance fields, and simulation
//!
//! The pipeline is built in layers: [`collision`] holds model-space
//! geometry, [`sdf`] bakes that geometry into dense distance grids,
//! [`collision_object`] pairs a mesh and its field with a world
//! transform, and [`simulation`] steps objects and [`particles`]
//! against each other once per frame.

pub mod collision;
pub mod collision_object;
pub mod particles;
pub mod sdf;
pub mod simulation;

pub use collision::{Aabb, CollisionMesh, Ray, Triangle};
pub use collision_object::CollisionObject;
pub use particles::{Particle, ParticleSystem};
pub use sdf::SignedDistanceField;
pub use simulation::{ObjectKey, Simulation};
