//! Collision geometry
//!
//! Model-space geometry shared by the spatial index and the distance
//! field generator. Shapes are stored in local coordinates; the
//! [`crate::physics::collision_object::CollisionObject`] owns the
//! transform that places them in the world.
//!
//! - [`primitives`] - Rays, axis-aligned boxes, triangles
//! - [`mesh`] - Triangle-list collision meshes

pub mod mesh;
pub mod primitives;

pub use mesh::CollisionMesh;
pub use primitives::{Aabb, Ray, Triangle};
