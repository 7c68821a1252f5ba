//! Spatial acceleration structures
//!
//! Provides the bounding volume hierarchy used to accelerate closest-point
//! and ray queries over triangle meshes.

pub mod bvh;

pub use bvh::Bvh;
