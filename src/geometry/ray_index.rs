//! Exact ray-to-face resolution.
//!
//! Faces are compiled into a bounding volume hierarchy over their flat
//! triangles. A query casts a ray from the origin along the direction and
//! reports the nearest triangle it crosses. Because every vertex lies on the
//! unit sphere, the radial projection of a flat triangle is exactly its
//! spherical triangle, so the hit face is the face containing the direction.

use glam::DVec3;
use rayon::prelude::*;

use crate::constants::{BVH_MAX_LEAF_FACES, MISS_SENTINEL, RAY_EDGE_EPSILON, RAY_PARALLEL_EPSILON};

#[derive(Clone, Copy, Debug)]
struct Triangle {
    v0: DVec3,
    v1: DVec3,
    v2: DVec3,
}

impl Triangle {
    fn centroid(&self) -> DVec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    fn aabb(&self) -> (DVec3, DVec3) {
        (
            self.v0.min(self.v1).min(self.v2),
            self.v0.max(self.v1).max(self.v2),
        )
    }

    /// Distance along a ray from the origin at which it crosses this triangle.
    ///
    /// Möller-Trumbore with a little barycentric slack so rays through a
    /// shared edge or vertex still register on one of the adjacent faces.
    fn intersect_from_origin(&self, direction: DVec3) -> Option<f64> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < RAY_PARALLEL_EPSILON * edge1.length() * edge2.length() {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = -self.v0;
        let u = inv_det * s.dot(h);
        if u < -RAY_EDGE_EPSILON || u > 1.0 + RAY_EDGE_EPSILON {
            return None;
        }
        let q = s.cross(edge1);
        let v = inv_det * direction.dot(q);
        if v < -RAY_EDGE_EPSILON || u + v > 1.0 + RAY_EDGE_EPSILON {
            return None;
        }
        let t = inv_det * edge2.dot(q);
        (t > RAY_EDGE_EPSILON).then_some(t)
    }
}

#[derive(Clone, Copy, Debug)]
struct BvhNode {
    aabb_min: DVec3,
    aabb_max: DVec3,
    left_or_start: u32,  // left child index (internal) or first face slot (leaf)
    right_or_count: u32, // right child index (internal) or face count (leaf)
    is_leaf: bool,
}

impl BvhNode {
    /// Slab test for a ray from the origin. Returns the entry distance.
    fn entry_distance(&self, direction: DVec3, inv_direction: DVec3) -> Option<f64> {
        let mut t_near = 0.0f64;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            if direction[axis] == 0.0 {
                // The ray stays on the plane through the origin for this axis.
                if self.aabb_min[axis] > 0.0 || self.aabb_max[axis] < 0.0 {
                    return None;
                }
                continue;
            }
            let t1 = self.aabb_min[axis] * inv_direction[axis];
            let t2 = self.aabb_max[axis] * inv_direction[axis];
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }
        (t_far >= t_near).then_some(t_near)
    }
}

/// Acceleration structure resolving directions to the face they hit.
pub struct RayFaceIndex {
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
    face_order: Vec<u32>,
}

impl RayFaceIndex {
    pub fn new(vertices: &[DVec3], faces: &[[usize; 3]]) -> Self {
        let triangles: Vec<Triangle> = faces
            .iter()
            .map(|&[a, b, c]| Triangle {
                v0: vertices[a],
                v1: vertices[b],
                v2: vertices[c],
            })
            .collect();

        let mut face_order: Vec<u32> = (0..triangles.len() as u32).collect();
        let mut nodes = Vec::with_capacity(2 * triangles.len() / BVH_MAX_LEAF_FACES + 1);
        if !triangles.is_empty() {
            let centroids: Vec<DVec3> = triangles.iter().map(Triangle::centroid).collect();
            let aabbs: Vec<(DVec3, DVec3)> = triangles.iter().map(Triangle::aabb).collect();
            let n = triangles.len();
            build_recursive(&mut nodes, &mut face_order, &centroids, &aabbs, 0, n);
        }

        log::debug!(
            "ray-face index: {} faces, {} nodes",
            triangles.len(),
            nodes.len()
        );

        Self {
            triangles,
            nodes,
            face_order,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// Face first struck by a ray from the origin along `direction`, or `None` on a miss.
    pub fn resolve(&self, direction: DVec3) -> Option<usize> {
        if self.nodes.is_empty() || direction == DVec3::ZERO {
            return None;
        }
        let inv_direction = direction.recip();

        let mut best: Option<(f64, u32)> = None;
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx as usize];
            let Some(entry) = node.entry_distance(direction, inv_direction) else {
                continue;
            };
            if let Some((best_t, _)) = best {
                if entry > best_t {
                    continue;
                }
            }

            if node.is_leaf {
                let start = node.left_or_start as usize;
                let end = start + node.right_or_count as usize;
                for &face in &self.face_order[start..end] {
                    if let Some(t) = self.triangles[face as usize].intersect_from_origin(direction) {
                        // Ties go to the lower face index so results are deterministic.
                        let better = match best {
                            None => true,
                            Some((best_t, best_face)) => {
                                t < best_t || (t == best_t && face < best_face)
                            }
                        };
                        if better {
                            best = Some((t, face));
                        }
                    }
                }
            } else {
                stack.push(node.left_or_start);
                stack.push(node.right_or_count);
            }
        }

        best.map(|(_, face)| face as usize)
    }

    /// Resolve many directions on the rayon pool.
    pub fn resolve_many(&self, directions: &[DVec3]) -> Vec<Option<usize>> {
        directions.par_iter().map(|&d| self.resolve(d)).collect()
    }
}

/// Integer face ids with misses encoded as `MISS_SENTINEL`.
pub fn face_ids_with_sentinel(faces: &[Option<usize>]) -> Vec<i64> {
    faces
        .iter()
        .map(|f| f.map_or(MISS_SENTINEL, |f| f as i64))
        .collect()
}

fn build_recursive(
    nodes: &mut Vec<BvhNode>,
    face_order: &mut [u32],
    centroids: &[DVec3],
    aabbs: &[(DVec3, DVec3)],
    start: usize,
    end: usize,
) -> u32 {
    let count = end - start;

    let (mut node_min, mut node_max) = aabbs[face_order[start] as usize];
    let mut centroid_min = centroids[face_order[start] as usize];
    let mut centroid_max = centroid_min;
    for &face in &face_order[start + 1..end] {
        let (tri_min, tri_max) = aabbs[face as usize];
        node_min = node_min.min(tri_min);
        node_max = node_max.max(tri_max);
        centroid_min = centroid_min.min(centroids[face as usize]);
        centroid_max = centroid_max.max(centroids[face as usize]);
    }

    let extent = centroid_max - centroid_min;
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };

    if count <= BVH_MAX_LEAF_FACES || extent[axis] <= 0.0 {
        let node_idx = nodes.len() as u32;
        nodes.push(BvhNode {
            aabb_min: node_min,
            aabb_max: node_max,
            left_or_start: start as u32,
            right_or_count: count as u32,
            is_leaf: true,
        });
        return node_idx;
    }

    // Median split along the widest centroid axis.
    let mid = start + count / 2;
    face_order[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
        centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
    });

    let node_idx = nodes.len() as u32;
    nodes.push(BvhNode {
        aabb_min: node_min,
        aabb_max: node_max,
        left_or_start: 0,  // Will be filled in
        right_or_count: 0, // Will be filled in
        is_leaf: false,
    });

    let left_idx = build_recursive(nodes, face_order, centroids, aabbs, start, mid);
    let right_idx = build_recursive(nodes, face_order, centroids, aabbs, mid, end);

    nodes[node_idx as usize].left_or_start = left_idx;
    nodes[node_idx as usize].right_or_count = right_idx;

    node_idx
}
