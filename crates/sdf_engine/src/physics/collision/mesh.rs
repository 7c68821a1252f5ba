//! Triangle soup collision mesh
//!
//! The mesh the distance field and spatial index are built from: a flat
//! list of triangles with a precomputed bounding box. Triangles are
//! immutable once the mesh is constructed.

use crate::foundation::math::Vec3;
use super::primitives::{Aabb, Triangle};

/// A triangle mesh used for collision queries
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    triangles: Vec<Triangle>,
    bounds: Aabb,
}

impl CollisionMesh {
    /// Build a mesh from a triangle list, computing the bounding box
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut bounds = Aabb::empty();
        for tri in &triangles {
            bounds.grow(tri.a);
            bounds.grow(tri.b);
            bounds.grow(tri.c);
        }
        if triangles.is_empty() {
            bounds = Aabb::new(Vec3::zeros(), Vec3::zeros());
        }
        Self { triangles, bounds }
    }

    /// Axis-aligned box mesh centered at the origin (12 triangles)
    ///
    /// Face windings are chosen so every precomputed normal points outward,
    /// giving a closed mesh suitable for inside/outside parity tests.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let corners = [
            Vec3::new(-h.x, -h.y, -h.z), // 0
            Vec3::new(h.x, -h.y, -h.z),  // 1
            Vec3::new(h.x, h.y, -h.z),   // 2
            Vec3::new(-h.x, h.y, -h.z),  // 3
            Vec3::new(-h.x, -h.y, h.z),  // 4
            Vec3::new(h.x, -h.y, h.z),   // 5
            Vec3::new(h.x, h.y, h.z),    // 6
            Vec3::new(-h.x, h.y, h.z),   // 7
        ];

        // Two counter-clockwise triangles per face, viewed from outside
        let faces: [[usize; 4]; 6] = [
            [1, 0, 3, 2], // -Z
            [4, 5, 6, 7], // +Z
            [0, 4, 7, 3], // -X
            [5, 1, 2, 6], // +X
            [0, 1, 5, 4], // -Y
            [7, 6, 2, 3], // +Y
        ];

        let mut triangles = Vec::with_capacity(12);
        for face in &faces {
            triangles.push(Triangle::new(
                corners[face[0]],
                corners[face[1]],
                corners[face[2]],
            ));
            triangles.push(Triangle::new(
                corners[face[0]],
                corners[face[2]],
                corners[face[3]],
            ));
        }

        Self::from_triangles(triangles)
    }

    /// The mesh triangles
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh holds no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Tight bounding box over all vertices (zero box for an empty mesh)
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}
