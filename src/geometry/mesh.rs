//! Mesh generation for a spherical cap.
//!
//! Interior vertices come from a golden-angle spiral, which spaces them by
//! roughly equal area. A ring of vertices is then placed exactly on the
//! maximum zenith distance so the mesh boundary reaches it at every azimuth,
//! and interior vertices crowding the ring are dropped. The result is
//! triangulated by a planar Delaunay triangulation of the xy-projection.

use glam::DVec3;

use super::delaunay::PlanarDelaunay;
use super::sphere::{angle_to_chord, az_zd_to_unit, cap_solid_angle, fibonacci_cap_points};
use crate::config::HemisphereConfig;
use crate::constants::{FACES_PER_VERTEX, MIN_RING_VERTICES};
use crate::error::ConfigurationError;
use crate::util::Timed;

/// Vertices and triangular faces of a cap mesh.
#[derive(Debug, Clone)]
pub struct CapMesh {
    /// Unit vectors; the horizon ring comes last.
    pub vertices: Vec<DVec3>,
    /// Each face references three distinct vertices.
    pub faces: Vec<[usize; 3]>,
    /// Number of ring vertices at the end of `vertices`.
    pub num_ring_vertices: usize,
}

impl CapMesh {
    /// Generate vertices and faces for the cap described by `config`.
    pub fn generate(config: &HemisphereConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut timer = Timed::debug("Cap mesh generation");

        let (vertices, num_ring_vertices) = make_vertices(config)?;
        let faces = make_faces(&vertices)?;
        log::debug!(
            "cap mesh: {} vertices ({} on ring), {} faces",
            vertices.len(),
            num_ring_vertices,
            faces.len()
        );

        timer.record(vertices.len());
        Ok(Self {
            vertices,
            faces,
            num_ring_vertices,
        })
    }
}

/// Expected angular edge length of a face when `num_vertices` vertices cover the cap.
pub fn expected_edge_angle(num_vertices: usize, max_zenith_distance_rad: f64) -> f64 {
    let expected_num_faces = FACES_PER_VERTEX * num_vertices as f64;
    let face_solid_angle = cap_solid_angle(max_zenith_distance_rad) / expected_num_faces;
    face_solid_angle.sqrt()
}

/// Vertices on the ring at exactly `max_zenith_distance_rad`, spaced by about `edge_angle`.
pub fn make_ring_vertices(max_zenith_distance_rad: f64, edge_angle: f64) -> Vec<DVec3> {
    let circumference = std::f64::consts::TAU * max_zenith_distance_rad.sin();
    let n = ((circumference / edge_angle).ceil() as usize).max(MIN_RING_VERTICES);
    (0..n)
        .map(|i| {
            let azimuth = std::f64::consts::TAU * i as f64 / n as f64;
            az_zd_to_unit(azimuth, max_zenith_distance_rad)
        })
        .collect()
}

/// Index of the ring vertex nearest to `v` for a ring of `num_ring` vertices.
///
/// Ring vertices sit at azimuths `2 pi k / num_ring`. Angular distance to a
/// ring vertex grows with the azimuth difference, so the nearest one is the
/// closest in azimuth.
pub fn nearest_ring_vertex(v: DVec3, num_ring: usize) -> usize {
    let step = std::f64::consts::TAU / num_ring as f64;
    let azimuth = v.y.atan2(v.x).rem_euclid(std::f64::consts::TAU);
    (azimuth / step).round() as usize % num_ring
}

/// Spiral vertices merged with the horizon ring.
///
/// Returns the vertices (ring last) and the ring size. Spiral vertices
/// closer than one expected edge to any ring vertex are dropped, which keeps
/// sliver triangles out of the boundary band.
pub fn make_vertices(config: &HemisphereConfig) -> Result<(Vec<DVec3>, usize), ConfigurationError> {
    config.validate()?;
    let max_zd = config.max_zenith_distance();

    let edge_angle = expected_edge_angle(config.num_vertices, max_zd);
    if !(edge_angle > 0.0) {
        return Err(ConfigurationError::InvalidMaxZenithDistance(
            config.max_zenith_distance_rad,
        ));
    }
    let ring = make_ring_vertices(max_zd, edge_angle);
    let num_ring = ring.len();

    let min_chord = angle_to_chord(edge_angle);
    let mut vertices: Vec<DVec3> = fibonacci_cap_points(config.num_vertices, max_zd)
        .into_iter()
        .filter(|&v| (v - ring[nearest_ring_vertex(v, num_ring)]).length() >= min_chord)
        .collect();
    let num_dropped = config.num_vertices - vertices.len();

    log::debug!(
        "edge angle {:.4e} rad, {} ring vertices, {} spiral vertices dropped near ring",
        edge_angle,
        num_ring,
        num_dropped
    );

    vertices.extend(ring);
    Ok((vertices, num_ring))
}

/// Delaunay faces of the vertices' xy-projection.
pub fn make_faces(vertices: &[DVec3]) -> Result<Vec<[usize; 3]>, ConfigurationError> {
    let delaunay = PlanarDelaunay::compute(vertices)?;
    Ok(delaunay.triangles)
}
