//! Bounding volume hierarchy over mesh triangles
//!
//! Binary tree of axis-aligned boxes built once per mesh with a recursive
//! median split. Nodes live in a flat arena addressed by index, so leaves
//! carry a range into a shared triangle-id list instead of owning boxed
//! children.
//!
//! Two queries are supported: nearest-surface distance (branch-and-bound)
//! and ray intersection counting, which callers use for inside/outside
//! parity tests. Parity is only meaningful for closed, non-self-intersecting
//! meshes; open or self-intersecting input silently produces wrong signs.

use log::debug;

use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::{Aabb, Ray, Triangle};

/// Leaves stop splitting at this triangle count
const LEAF_TRIANGLE_LIMIT: usize = 4;

/// Hard recursion cap; prevents pathological trees on degenerate input
/// (e.g. many triangles sharing one centroid)
const MAX_DEPTH: u32 = 20;

/// Conservative bounding-sphere factor for leaf rejection: sphere radius is
/// this fraction of the longest edge around the centroid
const SPHERE_RADIUS_FACTOR: f32 = 0.6;

/// Node payload: either a slice of triangle ids or two child node indices
#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: u32, count: u32 },
    Internal { left: u32, right: u32 },
}

/// Single node in the hierarchy
#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Bounding volume hierarchy over a triangle list
///
/// Built once and immutable thereafter; the triangle list itself stays with
/// the caller and is passed into each query, so the tree stores indices
/// only.
#[derive(Debug, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    triangle_ids: Vec<u32>,
}

impl Bvh {
    /// Build the hierarchy for the given triangles
    pub fn build(triangles: &[Triangle]) -> Self {
        debug!("Building BVH for {} triangles", triangles.len());

        let mut bvh = Self {
            nodes: Vec::new(),
            triangle_ids: Vec::new(),
        };

        if triangles.is_empty() {
            return bvh;
        }

        let mut ids: Vec<u32> = (0..triangles.len() as u32).collect();
        bvh.build_recursive(triangles, &mut ids, 0);

        debug!(
            "BVH construction complete: {} nodes, {} leaf entries",
            bvh.nodes.len(),
            bvh.triangle_ids.len()
        );
        bvh
    }

    /// Distance from a point to the nearest triangle surface
    ///
    /// Returns `f32::MAX` for an empty tree.
    pub fn closest_distance(&self, point: Vec3, triangles: &[Triangle]) -> f32 {
        if self.nodes.is_empty() {
            return f32::MAX;
        }
        let mut best = f32::MAX;
        self.closest_recursive(point, triangles, 0, &mut best);
        best
    }

    /// Number of triangle intersections along a ray from `origin`
    ///
    /// Every forward hit counts regardless of facing; the caller takes the
    /// parity of the result as its inside/outside test.
    pub fn count_ray_hits(&self, origin: Vec3, direction: Vec3, triangles: &[Triangle]) -> u32 {
        if self.nodes.is_empty() {
            return 0;
        }
        let ray = Ray::new(origin, direction);
        self.count_recursive(&ray, triangles, 0)
    }

    fn build_recursive(&mut self, triangles: &[Triangle], ids: &mut [u32], depth: u32) -> u32 {
        let mut bounds = Aabb::empty();
        for &id in ids.iter() {
            bounds.grow_aabb(&triangles[id as usize].bounds());
        }

        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { start: 0, count: 0 },
        });

        if ids.len() <= LEAF_TRIANGLE_LIMIT || depth > MAX_DEPTH {
            let start = self.triangle_ids.len() as u32;
            self.triangle_ids.extend_from_slice(ids);
            self.nodes[index as usize].kind = NodeKind::Leaf {
                start,
                count: ids.len() as u32,
            };
            return index;
        }

        // Median split along the widest axis, ordered by centroid projection
        let axis = bounds.longest_axis();
        ids.sort_by(|&a, &b| {
            let ca = triangles[a as usize].centroid()[axis];
            let cb = triangles[b as usize].centroid()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = ids.len() / 2;
        let (left_ids, right_ids) = ids.split_at_mut(mid);

        let left = self.build_recursive(triangles, left_ids, depth + 1);
        let right = self.build_recursive(triangles, right_ids, depth + 1);
        self.nodes[index as usize].kind = NodeKind::Internal { left, right };

        index
    }

    fn closest_recursive(&self, point: Vec3, triangles: &[Triangle], node: u32, best: &mut f32) {
        let node = &self.nodes[node as usize];

        // Lower bound prune
        if node.bounds.distance_to_point(point) >= *best {
            return;
        }

        match node.kind {
            NodeKind::Leaf { start, count } => {
                for &id in &self.triangle_ids[start as usize..(start + count) as usize] {
                    let tri = &triangles[id as usize];

                    // Cheap bounding-sphere rejection before the full
                    // barycentric closest-point computation
                    let sphere_dist = (point - tri.centroid()).norm()
                        - tri.longest_edge() * SPHERE_RADIUS_FACTOR;
                    if sphere_dist >= *best {
                        continue;
                    }

                    let distance = tri.closest_distance(point);
                    if distance < *best {
                        *best = distance;
                    }
                }
            }
            NodeKind::Internal { left, right } => {
                // Descend into the nearer child first so its result tightens
                // the bound before the farther child is considered
                let left_dist = self.nodes[left as usize].bounds.distance_to_point(point);
                let right_dist = self.nodes[right as usize].bounds.distance_to_point(point);

                let (first, second) = if left_dist <= right_dist {
                    (left, right)
                } else {
                    (right, left)
                };

                self.closest_recursive(point, triangles, first, best);
                self.closest_recursive(point, triangles, second, best);
            }
        }
    }

    fn count_recursive(&self, ray: &Ray, triangles: &[Triangle], node: u32) -> u32 {
        let node = &self.nodes[node as usize];

        if !node.bounds.intersects_ray(ray) {
            return 0;
        }

        match node.kind {
            NodeKind::Leaf { start, count } => {
                let mut hits = 0;
                for &id in &self.triangle_ids[start as usize..(start + count) as usize] {
                    if triangles[id as usize].intersect_ray(ray).is_some() {
                        hits += 1;
                    }
                }
                hits
            }
            NodeKind::Internal { left, right } => {
                self.count_recursive(ray, triangles, left)
                    + self.count_recursive(ray, triangles, right)
            }
        }
    }
}
