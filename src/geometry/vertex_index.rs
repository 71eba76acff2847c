//! Nearest-vertex and radius queries over the mesh vertices.
//!
//! Distances are chord lengths on the unit sphere; their ordering matches
//! angular distance, so k-nearest results are also nearest by angle.

use glam::{DQuat, DVec3};
use kiddo::{ImmutableKdTree, SquaredEuclidean};

/// A vertex index returned by a query, with its chord distance to the query direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexDistance {
    pub vertex: usize,
    pub chord: f64,
}

/// k-d tree over the vertex set.
///
/// Points are stored in a fixed tilted frame. Horizon rings share one z
/// value, and the immutable tree cannot split a bucket whose points all
/// share the split coordinate.
pub struct VertexIndex {
    tree: ImmutableKdTree<f64, 3>,
    frame: DQuat,
    len: usize,
}

fn tilted_frame() -> DQuat {
    DQuat::from_axis_angle(DVec3::new(0.36, 0.48, 0.8).normalize(), 0.731)
}

impl VertexIndex {
    pub fn new(vertices: &[DVec3]) -> Self {
        let frame = tilted_frame();
        let entries: Vec<[f64; 3]> = vertices.iter().map(|&v| (frame * v).to_array()).collect();
        let tree = ImmutableKdTree::new_from_slice(&entries);
        Self {
            tree,
            frame,
            len: vertices.len(),
        }
    }

    /// Number of indexed vertices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k` vertices closest to `direction`, nearest first.
    ///
    /// Returns fewer than `k` entries only if the index holds fewer vertices.
    pub fn k_nearest(&self, direction: DVec3, k: usize) -> Vec<VertexDistance> {
        if k == 0 || self.len == 0 {
            return Vec::new();
        }
        self.tree
            .nearest_n::<SquaredEuclidean>(&(self.frame * direction).to_array(), k)
            .into_iter()
            .map(|n| VertexDistance {
                vertex: n.item as usize,
                chord: n.distance.sqrt(),
            })
            .collect()
    }

    /// Every vertex whose chord distance to `direction` is at most `chord`, unordered.
    pub fn radius_query(&self, direction: DVec3, chord: f64) -> Vec<usize> {
        if self.len == 0 || chord < 0.0 {
            return Vec::new();
        }
        // Relative widening keeps vertices exactly on the boundary.
        let radius_sq = chord * chord * (1.0 + 1e-12);
        self.tree
            .within_unsorted::<SquaredEuclidean>(&(self.frame * direction).to_array(), radius_sq)
            .into_iter()
            .map(|n| n.item as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fibonacci_cap_points;

    fn brute_force_nearest(points: &[DVec3], q: DVec3, k: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..points.len()).collect();
        idx.sort_by(|&a, &b| {
            (points[a] - q)
                .length_squared()
                .total_cmp(&(points[b] - q).length_squared())
        });
        idx.truncate(k);
        idx
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let points = fibonacci_cap_points(300, std::f64::consts::FRAC_PI_2);
        let index = VertexIndex::new(&points);
        assert_eq!(index.len(), 300);

        for q in [DVec3::Z, DVec3::new(0.6, 0.0, 0.8), DVec3::new(-0.3, 0.4, 0.866)] {
            let q = q.normalize();
            let got = index.k_nearest(q, 3);
            assert_eq!(got.len(), 3);
            let expected = brute_force_nearest(&points, q, 3);
            let got_ids: Vec<usize> = got.iter().map(|d| d.vertex).collect();
            assert_eq!(got_ids, expected);
            for d in &got {
                assert!((d.chord - (points[d.vertex] - q).length()).abs() < 1e-12);
            }
            // Nearest first.
            assert!(got[0].chord <= got[1].chord && got[1].chord <= got[2].chord);
        }
    }

    #[test]
    fn test_radius_query_matches_brute_force() {
        let points = fibonacci_cap_points(400, 1.2);
        let index = VertexIndex::new(&points);
        let q = DVec3::new(0.2, -0.1, 1.0).normalize();
        let r = 0.35;

        let mut got = index.radius_query(q, r);
        got.sort_unstable();
        let mut expected: Vec<usize> = (0..points.len())
            .filter(|&i| (points[i] - q).length() <= r)
            .collect();
        expected.sort_unstable();
        assert_eq!(got, expected);
        assert!(!got.is_empty());
    }

    #[test]
    fn test_ring_sharing_one_z() {
        let ring = crate::geometry::make_ring_vertices(1.2, 0.01);
        assert!(ring.len() > 500);
        let mut points = fibonacci_cap_points(300, 1.1);
        points.extend_from_slice(&ring);
        let index = VertexIndex::new(&points);

        let queries = [
            crate::geometry::az_zd_to_unit(0.0123, 1.19),
            crate::geometry::az_zd_to_unit(3.3071, 1.2),
            DVec3::new(0.5, 0.5, 0.7).normalize(),
        ];
        for q in queries {
            let got: Vec<usize> = index.k_nearest(q, 4).iter().map(|d| d.vertex).collect();
            assert_eq!(got, brute_force_nearest(&points, q, 4));

            let mut got = index.radius_query(q, 0.05);
            got.sort_unstable();
            let expected: Vec<usize> = (0..points.len())
                .filter(|&i| (points[i] - q).length() <= 0.05)
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_k_larger_than_len() {
        let points = vec![DVec3::Z, DVec3::X, DVec3::Y];
        let index = VertexIndex::new(&points);
        assert_eq!(index.k_nearest(DVec3::Z, 10).len(), 3);
        assert!(index.k_nearest(DVec3::Z, 0).is_empty());
    }
}
