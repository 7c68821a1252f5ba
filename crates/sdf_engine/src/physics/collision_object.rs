//! Collidable rigid body backed by a signed distance field
//!
//! Wraps a mesh and its distance field with a rigid transform (position,
//! rotation, non-uniform scale), a velocity, and a mass. World-space
//! queries are answered by transforming into local space and sampling the
//! field; the composed transform matrix and its inverse are cached behind a
//! dirty flag and recomputed lazily on read.

use std::cell::Cell;
use std::path::Path;

use log::info;

use crate::assets::obj_loader::{ObjError, ObjLoader};
use crate::foundation::math::{Mat3, Mat4, Point3, Quat, Transform, Vec3};
use crate::physics::collision::mesh::CollisionMesh;
use crate::physics::collision::primitives::Aabb;
use crate::physics::sdf::SignedDistanceField;

/// Composed world and inverse matrices, rebuilt together
#[derive(Debug, Clone, Copy)]
struct MatrixCache {
    world: Mat4,
    inverse: Mat4,
}

/// A mesh-shaped body that can be queried for signed distance and collided
/// against
///
/// Mass encodes mobility: `mass <= 0` means static (infinite mass,
/// `inverse_mass == 0`); downstream impulse formulas are written purely in
/// terms of inverse mass so static and dynamic bodies share one code path.
#[derive(Debug)]
pub struct CollisionObject {
    mesh: CollisionMesh,
    sdf: SignedDistanceField,

    transform: Transform,
    velocity: Vec3,
    mass: f32,
    inverse_mass: f32,

    // None encodes the dirty state; queries recompute on read
    matrices: Cell<Option<MatrixCache>>,
}

impl CollisionObject {
    /// Build a body from an in-memory mesh, generating its distance field
    ///
    /// The default mass assumes unit density over the bounding-box volume;
    /// callers override it afterwards where that is too crude.
    pub fn from_mesh(mesh: CollisionMesh, sdf_resolution: usize) -> Self {
        let sdf = SignedDistanceField::generate(&mesh, sdf_resolution);

        let size = mesh.bounds().extent();
        let volume = size.x * size.y * size.z;

        let mut object = Self {
            mesh,
            sdf,
            transform: Transform::identity(),
            velocity: Vec3::zeros(),
            mass: 0.0,
            inverse_mass: 0.0,
            matrices: Cell::new(None),
        };
        object.set_mass(volume);
        object
    }

    /// Load a mesh from an OBJ file and build a body from it
    pub fn load_from_obj<P: AsRef<Path>>(path: P, sdf_resolution: usize) -> Result<Self, ObjError> {
        let mesh = ObjLoader::load_collision_mesh(&path)?;
        info!(
            "Loaded collision mesh from {:?}: {} triangles",
            path.as_ref(),
            mesh.triangle_count()
        );
        Ok(Self::from_mesh(mesh, sdf_resolution))
    }

    /// The collision mesh in local space
    pub fn mesh(&self) -> &CollisionMesh {
        &self.mesh
    }

    /// The generated distance field in local space
    pub fn sdf(&self) -> &SignedDistanceField {
        &self.sdf
    }

    /// A body with no triangles cannot participate in collision queries
    pub fn is_valid(&self) -> bool {
        !self.mesh.is_empty()
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Set the world-space position
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.matrices.set(None);
    }

    /// Rotation quaternion
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Set the rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
        self.matrices.set(None);
    }

    /// Per-axis scale factors
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// Set per-axis scale factors
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
        self.matrices.set(None);
    }

    /// Linear velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Set the linear velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Mass in arbitrary units; non-positive means static
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Cached reciprocal mass (0 for static bodies)
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Set the mass, refreshing the cached inverse
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    /// True for immovable, infinite-mass bodies
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    /// Euler position integration; static bodies never move
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_static() && dt > 0.0 {
            let position = self.transform.position + self.velocity * dt;
            self.set_position(position);
        }
    }

    /// Composed local-to-world matrix (translation * rotation * scale)
    pub fn transform_matrix(&self) -> Mat4 {
        self.matrices().world
    }

    /// Cached world-to-local matrix
    pub fn inverse_transform_matrix(&self) -> Mat4 {
        self.matrices().inverse
    }

    /// Signed distance from a world-space point to this body's surface
    ///
    /// The local sample is rescaled by the smallest scale axis, which is
    /// exact for uniform scaling only; non-uniform scale underestimates
    /// distances along the stretched axes. Invalid bodies report
    /// `f32::MAX`.
    pub fn signed_distance(&self, world_point: Vec3) -> f32 {
        if !self.is_valid() {
            return f32::MAX;
        }

        let local = self.world_to_local(world_point);
        let local_distance = self.sdf.sample(local);
        local_distance * self.transform.min_scale()
    }

    /// Estimated outward surface normal at a world-space point
    ///
    /// Normals transform by the inverse-transpose, which stays correct
    /// under non-uniform scale. Returns zero when the local gradient
    /// vanishes (flat field region); callers skip response in that case.
    /// Invalid bodies report +Y.
    pub fn normal(&self, world_point: Vec3) -> Vec3 {
        if !self.is_valid() {
            return Vec3::y();
        }

        let local = self.world_to_local(world_point);
        let local_normal = self.sdf.gradient(local);

        let normal_matrix: Mat3 = self
            .inverse_transform_matrix()
            .transpose()
            .fixed_view::<3, 3>(0, 0)
            .into_owned();
        let world_normal = normal_matrix * local_normal;

        let len = world_normal.norm();
        if len > f32::EPSILON {
            world_normal / len
        } else {
            Vec3::zeros()
        }
    }

    /// World-space bounding box: the local mesh bounds pushed through the
    /// current transform corner by corner
    pub fn world_aabb(&self) -> Aabb {
        let local = self.mesh.bounds();
        let matrix = self.transform_matrix();

        let mut bounds = Aabb::empty();
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 != 0 { local.max.x } else { local.min.x },
                if i & 2 != 0 { local.max.y } else { local.min.y },
                if i & 4 != 0 { local.max.z } else { local.min.z },
            );
            bounds.grow(matrix.transform_point(&corner).coords);
        }
        bounds
    }

    fn matrices(&self) -> MatrixCache {
        if let Some(cache) = self.matrices.get() {
            return cache;
        }

        let world = self.transform.to_matrix();
        let inverse = world.try_inverse().unwrap_or_else(Mat4::identity);
        let cache = MatrixCache { world, inverse };
        self.matrices.set(Some(cache));
        cache
    }

    fn world_to_local(&self, world_point: Vec3) -> Vec3 {
        self.inverse_transform_matrix()
            .transform_point(&Point3::from(world_point))
            .coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube_object() -> CollisionObject {
        CollisionObject::from_mesh(CollisionMesh::cuboid(Vec3::new(0.5, 0.5, 0.5)), 8)
    }

    #[test]
    fn test_default_mass_from_volume() {
        let object = unit_cube_object();

        // Unit cube, unit density
        assert_relative_eq!(object.mass(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(object.inverse_mass(), 1.0, epsilon = 1e-5);
        assert!(!object.is_static());

        let big = CollisionObject::from_mesh(CollisionMesh::cuboid(Vec3::new(1.0, 1.0, 1.0)), 8);
        assert_relative_eq!(big.mass(), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_static_flag() {
        let mut object = unit_cube_object();

        object.set_mass(0.0);
        assert!(object.is_static());
        assert_eq!(object.inverse_mass(), 0.0);

        object.set_mass(-5.0);
        assert!(object.is_static());

        object.set_mass(2.0);
        assert!(!object.is_static());
        assert_relative_eq!(object.inverse_mass(), 0.5);
    }

    #[test]
    fn test_transform_cache_invalidation() {
        let mut object = unit_cube_object();

        let before = object.transform_matrix();
        object.set_position(Vec3::new(3.0, 0.0, 0.0));
        let after = object.transform_matrix();

        assert_relative_eq!(before[(0, 3)], 0.0);
        assert_relative_eq!(after[(0, 3)], 3.0);

        // Inverse tracks the same mutation
        let p = object.inverse_transform_matrix().transform_point(&Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_signed_distance_translated() {
        let mut object = unit_cube_object();
        object.set_position(Vec3::new(10.0, 0.0, 0.0));

        // Surface now spans x in [9.5, 10.5]
        let outside = object.signed_distance(Vec3::new(10.9, 0.1, 0.2));
        assert!(outside > 0.0);

        let inside = object.signed_distance(Vec3::new(10.1, 0.15, -0.05));
        assert!(inside < 0.0);
    }

    #[test]
    fn test_integrate_moves_dynamic_only() {
        let mut object = unit_cube_object();
        object.set_velocity(Vec3::new(1.0, 2.0, 0.0));
        object.integrate(0.5);
        assert_relative_eq!(object.position(), Vec3::new(0.5, 1.0, 0.0), epsilon = 1e-6);

        let mut fixed = unit_cube_object();
        fixed.set_mass(0.0);
        fixed.set_velocity(Vec3::new(1.0, 0.0, 0.0));
        fixed.integrate(0.5);
        assert_eq!(fixed.position(), Vec3::zeros());
    }

    #[test]
    fn test_normal_on_translated_cube() {
        let mut object = unit_cube_object();
        object.set_position(Vec3::new(0.0, 5.0, 0.0));

        // Just inside the +X face (y and z chosen off the face diagonals)
        let n = object.normal(Vec3::new(0.4, 5.3, 0.3));
        assert!(n.x > 0.9, "normal {n:?} should point along +X");
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_min_scale_distance_is_conservative() {
        // Stretch the cube 2x along Z; distances along the stretched axis
        // are underestimated by the min-scale rescale, never overestimated
        let mut object = unit_cube_object();
        object.set_scale(Vec3::new(1.0, 1.0, 2.0));

        let query = Vec3::new(0.0, 0.0, 1.6);
        let true_distance = 1.6 - 1.0; // scaled surface sits at z = 1.0
        let approx = object.signed_distance(query);

        assert!(approx > 0.0);
        assert!(
            approx <= true_distance + 0.05,
            "approximation {approx} should not overshoot {true_distance}"
        );
    }

    #[test]
    fn test_world_aabb_follows_transform() {
        let mut object = unit_cube_object();
        object.set_position(Vec3::new(2.0, 0.0, 0.0));
        object.set_scale(Vec3::new(2.0, 1.0, 1.0));

        let aabb = object.world_aabb();
        assert_relative_eq!(aabb.min, Vec3::new(1.0, -0.5, -0.5), epsilon = 1e-5);
        assert_relative_eq!(aabb.max, Vec3::new(3.0, 0.5, 0.5), epsilon = 1e-5);
    }
}
