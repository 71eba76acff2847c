//! Per-face solid angles and the vertex to face adjacency.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use smallvec::SmallVec;

use crate::error::ConfigurationError;

/// How the solid angle of a face is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolidAngleGeometry {
    /// Exact area of the spherical triangle.
    #[default]
    Spherical,
    /// Area of the flat triangle spanned by the vertices. Only close to the
    /// spherical value for small faces.
    Flat,
}

impl FromStr for SolidAngleGeometry {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spherical" => Ok(SolidAngleGeometry::Spherical),
            "flat" => Ok(SolidAngleGeometry::Flat),
            other => Err(ConfigurationError::UnknownSolidAngleGeometry(other.to_string())),
        }
    }
}

impl fmt::Display for SolidAngleGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolidAngleGeometry::Spherical => write!(f, "spherical"),
            SolidAngleGeometry::Flat => write!(f, "flat"),
        }
    }
}

/// Area of the spherical triangle with unit-vector corners, via the spherical excess.
pub fn spherical_triangle_area(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    // area = 2 * atan2(|a . (b x c)|, 1 + a.b + b.c + c.a)
    let numerator = a.dot(b.cross(c)).abs();
    let denominator = 1.0 + a.dot(b) + b.dot(c) + c.dot(a);
    2.0 * numerator.atan2(denominator)
}

/// Area of the flat triangle abc.
pub fn flat_triangle_area(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    0.5 * (b - a).cross(c - a).length()
}

/// Solid angle of every face.
pub fn face_solid_angles(
    vertices: &[DVec3],
    faces: &[[usize; 3]],
    geometry: SolidAngleGeometry,
) -> Vec<f64> {
    let area: fn(DVec3, DVec3, DVec3) -> f64 = match geometry {
        SolidAngleGeometry::Spherical => spherical_triangle_area,
        SolidAngleGeometry::Flat => flat_triangle_area,
    };
    faces
        .iter()
        .map(|&[i, j, k]| area(vertices[i], vertices[j], vertices[k]))
        .collect()
}

/// Faces touching each vertex.
///
/// Built in one pass over the faces and never modified afterwards. Most
/// vertices of a near-uniform mesh touch about six faces, which fits inline.
#[derive(Debug, Clone)]
pub struct AdjacencyMap {
    faces_of_vertex: Vec<SmallVec<[u32; 8]>>,
}

impl AdjacencyMap {
    pub fn build(num_vertices: usize, faces: &[[usize; 3]]) -> Self {
        let mut faces_of_vertex: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); num_vertices];
        for (face_idx, face) in faces.iter().enumerate() {
            // Face vertices are distinct, so each vertex sees the face once.
            for &v in face {
                faces_of_vertex[v].push(face_idx as u32);
            }
        }
        Self { faces_of_vertex }
    }

    /// Faces that reference `vertex`.
    #[inline]
    pub fn faces(&self, vertex: usize) -> &[u32] {
        &self.faces_of_vertex[vertex]
    }

    pub fn num_vertices(&self) -> usize {
        self.faces_of_vertex.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_octant_area() {
        // One octant of the sphere covers 4pi / 8.
        let area = spherical_triangle_area(DVec3::X, DVec3::Y, DVec3::Z);
        assert!((area - PI / 2.0).abs() < 1e-12, "area = {}", area);
        // Winding does not matter.
        let flipped = spherical_triangle_area(DVec3::X, DVec3::Z, DVec3::Y);
        assert!((flipped - area).abs() < 1e-12);
    }

    #[test]
    fn test_flat_close_to_spherical_for_small_faces() {
        let d = 1e-3;
        let a = DVec3::Z;
        let b = DVec3::new(d, 0.0, 1.0).normalize();
        let c = DVec3::new(0.0, d, 1.0).normalize();
        let spherical = spherical_triangle_area(a, b, c);
        let flat = flat_triangle_area(a, b, c);
        assert!(((spherical - flat) / spherical).abs() < 1e-4);
    }

    #[test]
    fn test_geometry_from_str() {
        assert_eq!(
            "spherical".parse::<SolidAngleGeometry>(),
            Ok(SolidAngleGeometry::Spherical)
        );
        assert_eq!("flat".parse::<SolidAngleGeometry>(), Ok(SolidAngleGeometry::Flat));
        assert_eq!(
            "planar".parse::<SolidAngleGeometry>(),
            Err(ConfigurationError::UnknownSolidAngleGeometry("planar".to_string()))
        );
    }

    #[test]
    fn test_face_solid_angles_cover_upper_hemisphere() {
        // Four octants around the pole tile the upper hemisphere.
        let vertices = vec![DVec3::Z, DVec3::X, DVec3::Y, -DVec3::X, -DVec3::Y];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        let solid = face_solid_angles(&vertices, &faces, SolidAngleGeometry::Spherical);
        let total: f64 = solid.iter().sum();
        assert!((total - 2.0 * PI).abs() < 1e-12);
        for s in &solid {
            assert!((s - FRAC_PI_2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_adjacency_contains_each_face_three_times() {
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        let adjacency = AdjacencyMap::build(5, &faces);
        assert_eq!(adjacency.num_vertices(), 5);
        assert_eq!(adjacency.faces(0).len(), 4);
        assert_eq!(adjacency.faces(1), &[0, 3]);

        let mut appearances = vec![0usize; faces.len()];
        for v in 0..5 {
            for &f in adjacency.faces(v) {
                assert!(faces[f as usize].contains(&v));
                appearances[f as usize] += 1;
            }
        }
        assert!(appearances.iter().all(|&n| n == 3));
    }
}
