//! Primitive collision geometry and intersection algorithms
//!
//! Axis-aligned boxes, rays, and triangles with the exact-distance and
//! intersection routines the spatial index is built on.

use crate::foundation::math::Vec3;

/// Epsilon used by the ray/triangle test to reject near-parallel rays and
/// hits at the ray origin
pub const RAY_EPSILON: f32 = 1e-7;

/// A ray for intersection queries
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (not required to be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that becomes valid once grown around any point
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(f32::MIN),
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the AABB along each axis
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow the box to include a point
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to include another box
    pub fn grow_aabb(&mut self, other: &Aabb) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Index of the axis with the largest extent (0 = x, 1 = y, 2 = z)
    pub fn longest_axis(&self) -> usize {
        let extent = self.extent();
        let mut axis = 0;
        if extent.y > extent.x {
            axis = 1;
        }
        if extent.z > extent[axis] {
            axis = 2;
        }
        axis
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Euclidean distance from a point to the box surface (0 inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let closest = Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        );
        (point - closest).norm()
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns true when any part of the box lies on the forward side of the
    /// ray. Zero direction components map to an infinite inverse, which the
    /// min/max slab comparisons handle without branching.
    pub fn intersects_ray(&self, ray: &Ray) -> bool {
        let inv_dir = Vec3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t1 = (self.min - ray.origin).component_mul(&inv_dir);
        let t2 = (self.max - ray.origin).component_mul(&inv_dir);

        let tmin = t1.inf(&t2);
        let tmax = t1.sup(&t2);

        let t_near = tmin.x.max(tmin.y).max(tmin.z);
        let t_far = tmax.x.min(tmax.y).min(tmax.z);

        t_near <= t_far && t_far >= 0.0
    }
}

/// A mesh triangle with a precomputed face normal
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub a: Vec3,
    /// Second vertex
    pub b: Vec3,
    /// Third vertex
    pub c: Vec3,
    /// Face normal (zero for degenerate triangles)
    pub normal: Vec3,
}

impl Triangle {
    /// Creates a triangle and precomputes its face normal
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let cross = (b - a).cross(&(c - a));
        let normal = if cross.norm() > f32::EPSILON {
            cross.normalize()
        } else {
            Vec3::zeros()
        };
        Self { a, b, c, normal }
    }

    /// Calculates the centroid of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Length of the longest edge
    pub fn longest_edge(&self) -> f32 {
        let ab = (self.b - self.a).norm();
        let bc = (self.c - self.b).norm();
        let ca = (self.a - self.c).norm();
        ab.max(bc).max(ca)
    }

    /// Tight bounding box of the three vertices
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        bounds.grow(self.a);
        bounds.grow(self.b);
        bounds.grow(self.c);
        bounds
    }

    /// Closest point on the triangle to the given point
    ///
    /// Barycentric clamp over the seven Voronoi regions (three vertices,
    /// three edges, interior). See Ericson, "Real-Time Collision Detection",
    /// section 5.1.5.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge0 = self.b - self.a;
        let edge1 = self.c - self.a;
        let v0 = self.a - point;

        let a = edge0.dot(&edge0);
        let b = edge0.dot(&edge1);
        let c = edge1.dot(&edge1);
        let d = edge0.dot(&v0);
        let e = edge1.dot(&v0);

        let det = a * c - b * b;
        let mut s = b * e - c * d;
        let mut t = b * d - a * e;

        if s + t < det {
            if s < 0.0 {
                if t < 0.0 && d < 0.0 {
                    s = (-d / a).clamp(0.0, 1.0);
                    t = 0.0;
                } else {
                    s = 0.0;
                    t = (-e / c).clamp(0.0, 1.0);
                }
            } else if t < 0.0 {
                s = (-d / a).clamp(0.0, 1.0);
                t = 0.0;
            } else {
                let inv_det = 1.0 / det;
                s *= inv_det;
                t *= inv_det;
            }
        } else if s < 0.0 {
            let tmp0 = b + d;
            let tmp1 = c + e;
            if tmp1 > tmp0 {
                let numer = tmp1 - tmp0;
                let denom = a - 2.0 * b + c;
                s = (numer / denom).clamp(0.0, 1.0);
                t = 1.0 - s;
            } else {
                t = (-e / c).clamp(0.0, 1.0);
                s = 0.0;
            }
        } else if t < 0.0 {
            if a + d > b + e {
                let numer = c + e - b - d;
                let denom = a - 2.0 * b + c;
                s = (numer / denom).clamp(0.0, 1.0);
                t = 1.0 - s;
            } else {
                s = (-d / a).clamp(0.0, 1.0);
                t = 0.0;
            }
        } else {
            let numer = c + e - b - d;
            let denom = a - 2.0 * b + c;
            s = (numer / denom).clamp(0.0, 1.0);
            t = 1.0 - s;
        }

        self.a + edge0 * s + edge1 * t
    }

    /// Distance from a point to the triangle surface
    pub fn closest_distance(&self, point: Vec3) -> f32 {
        (point - self.closest_point(point)).norm()
    }

    /// Möller-Trumbore ray-triangle intersection
    ///
    /// Returns the ray parameter t for hits with `t > RAY_EPSILON`,
    /// regardless of which face the ray enters through. Near-parallel rays
    /// are rejected by the determinant guard.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;

        let h = ray.direction.cross(&edge2);
        let det = edge1.dot(&h);

        if det.abs() < RAY_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.a;
        let u = inv_det * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = inv_det * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(&q);
        if t > RAY_EPSILON {
            Some(t)
        } else {
            None
        }
    }
}
