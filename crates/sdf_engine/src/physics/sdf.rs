//! Dense signed distance field over a mesh
//!
//! A cubic grid of signed distances covering the mesh's padded bounding
//! box. Generation walks every cell once, querying the BVH for the nearest
//! surface distance and probing mesh parity along +X for the sign; the
//! result is immutable and supports trilinear sampling plus a central
//! difference gradient.
//!
//! Generation is a one-time blocking call: O(resolution^3) queries with no
//! cancellation. Sign correctness relies on the mesh being closed and free
//! of self-intersections.

use log::{info, warn};

use crate::foundation::math::utils::lerp;
use crate::foundation::math::Vec3;
use crate::physics::collision::mesh::CollisionMesh;
use crate::physics::collision::primitives::Aabb;
use crate::spatial::Bvh;

/// Fraction of the mesh extent added as padding on each side of the grid
const PADDING_FRACTION: f32 = 0.1;

/// Gradient step as a fraction of the cell size
const GRADIENT_STEP_FRACTION: f32 = 0.1;

/// Dense grid of signed distances to a mesh surface
#[derive(Debug, Clone)]
pub struct SignedDistanceField {
    resolution: usize,
    data: Vec<f32>,
    bounds: Aabb,
    cell_size: Vec3,
}

impl SignedDistanceField {
    /// Generate the field from a mesh at the given per-axis resolution
    ///
    /// Resolutions below 2 are raised to 2 so the cell size stays finite.
    /// An empty mesh yields a field that reports `f32::MAX` everywhere.
    pub fn generate(mesh: &CollisionMesh, resolution: usize) -> Self {
        let resolution = if resolution < 2 {
            warn!("SDF resolution {resolution} too small, clamping to 2");
            2
        } else {
            resolution
        };

        let mut bounds = mesh.bounds();
        let padding = bounds.extent() * PADDING_FRACTION;
        bounds.min -= padding;
        bounds.max += padding;

        let cell_size = bounds.extent() / (resolution as f32 - 1.0);

        let mut field = Self {
            resolution,
            data: vec![f32::MAX; resolution * resolution * resolution],
            bounds,
            cell_size,
        };

        if mesh.is_empty() {
            warn!("Generating SDF from an empty mesh; all samples are f32::MAX");
            return field;
        }

        info!(
            "Generating {res}x{res}x{res} SDF over ({:.3}, {:.3}, {:.3})..({:.3}, {:.3}, {:.3})",
            bounds.min.x,
            bounds.min.y,
            bounds.min.z,
            bounds.max.x,
            bounds.max.y,
            bounds.max.z,
            res = resolution,
        );

        let triangles = mesh.triangles();
        let bvh = Bvh::build(triangles);
        let probe_dir = Vec3::new(1.0, 0.0, 0.0);

        for z in 0..resolution {
            if z % 10 == 0 {
                info!("SDF generation progress: {}%", 100 * z / resolution);
            }
            for y in 0..resolution {
                for x in 0..resolution {
                    let world = bounds.min
                        + Vec3::new(x as f32, y as f32, z as f32).component_mul(&cell_size);

                    let mut distance = bvh.closest_distance(world, triangles);

                    // Odd crossing count along the +X probe means inside
                    let crossings = bvh.count_ray_hits(world, probe_dir, triangles);
                    if crossings % 2 == 1 {
                        distance = -distance;
                    }

                    let index = field.index(x, y, z);
                    field.data[index] = distance;
                }
            }
        }

        info!("SDF generation complete");
        field
    }

    /// Grid resolution per axis
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Padded world-space bounds the grid covers
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// World-space size of one grid cell per axis
    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Signed distance at a world-space point, trilinearly interpolated
    ///
    /// Points outside the grid are clamped to the boundary value; accuracy
    /// degrades there but the query never fails.
    pub fn sample(&self, position: Vec3) -> f32 {
        let limit = self.resolution as f32 - 1.0;
        let grid = self.world_to_grid(position);
        let grid = Vec3::new(
            grid.x.clamp(0.0, limit),
            grid.y.clamp(0.0, limit),
            grid.z.clamp(0.0, limit),
        );

        let x0 = grid.x as usize;
        let y0 = grid.y as usize;
        let z0 = grid.z as usize;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let y1 = (y0 + 1).min(self.resolution - 1);
        let z1 = (z0 + 1).min(self.resolution - 1);

        let fx = grid.x - x0 as f32;
        let fy = grid.y - y0 as f32;
        let fz = grid.z - z0 as f32;

        let c000 = self.data[self.index(x0, y0, z0)];
        let c001 = self.data[self.index(x0, y0, z1)];
        let c010 = self.data[self.index(x0, y1, z0)];
        let c011 = self.data[self.index(x0, y1, z1)];
        let c100 = self.data[self.index(x1, y0, z0)];
        let c101 = self.data[self.index(x1, y0, z1)];
        let c110 = self.data[self.index(x1, y1, z0)];
        let c111 = self.data[self.index(x1, y1, z1)];

        let c00 = lerp(c000, c100, fx);
        let c01 = lerp(c001, c101, fx);
        let c10 = lerp(c010, c110, fx);
        let c11 = lerp(c011, c111, fx);

        let c0 = lerp(c00, c10, fy);
        let c1 = lerp(c01, c11, fy);

        lerp(c0, c1, fz)
    }

    /// Estimated field gradient at a world-space point
    ///
    /// Central differences with a step of 0.1x the cell size. The result is
    /// not normalized; near-surface callers normalize it to get a surface
    /// normal, and must screen for near-zero magnitudes in flat regions.
    pub fn gradient(&self, position: Vec3) -> Vec3 {
        let epsilon = self.cell_size.x * GRADIENT_STEP_FRACTION;

        let dx = self.sample(position + Vec3::new(epsilon, 0.0, 0.0))
            - self.sample(position - Vec3::new(epsilon, 0.0, 0.0));
        let dy = self.sample(position + Vec3::new(0.0, epsilon, 0.0))
            - self.sample(position - Vec3::new(0.0, epsilon, 0.0));
        let dz = self.sample(position + Vec3::new(0.0, 0.0, epsilon))
            - self.sample(position - Vec3::new(0.0, 0.0, epsilon));

        Vec3::new(dx, dy, dz) / (2.0 * epsilon)
    }

    /// Raw stored value at a lattice point (for inspection and tests)
    pub fn value_at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.index(x, y, z)]
    }

    fn world_to_grid(&self, world: Vec3) -> Vec3 {
        (world - self.bounds.min).component_div(&self.cell_size)
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.resolution + y) * self.resolution + x
    }
}
