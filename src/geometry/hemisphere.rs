//! Hemisphere geometry: the immutable mesh plus everything needed to query it.
//!
//! Construction either generates a cap mesh or takes a pre-built one, then
//! derives per-face solid angles, the vertex to face adjacency, a k-d tree
//! over the vertices and a ray-face BVH. Nothing is mutated afterwards, so a
//! geometry can be shared by any number of histograms and threads.

use std::fmt;

use glam::DVec3;
use rustc_hash::FxHashSet;

use super::faces::{face_solid_angles, AdjacencyMap, SolidAngleGeometry};
use super::mesh::CapMesh;
use super::ray_index::RayFaceIndex;
use super::sphere::{angle_to_chord, check_unit, zenith_distance, Direction};
use super::vertex_index::VertexIndex;
use crate::config::HemisphereConfig;
use crate::constants::{CONE_NEIGHBORS, UNIT_NORM_MAX, UNIT_NORM_MIN};
use crate::error::ConfigurationError;
use crate::util::Timed;

/// Vertices, faces and optional per-face values handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    pub vertices: &'a [DVec3],
    pub faces: &'a [[usize; 3]],
    pub values: Option<&'a [f64]>,
}

/// A triangulated cap of the unit sphere with exact and approximate face lookup.
pub struct HemisphereGeometry {
    vertices: Vec<DVec3>,
    faces: Vec<[usize; 3]>,
    solid_angles: Vec<f64>,
    solid_angle_geometry: SolidAngleGeometry,
    max_zenith_distance_rad: f64,
    adjacency: AdjacencyMap,
    vertex_index: VertexIndex,
    ray_index: RayFaceIndex,
}

impl HemisphereGeometry {
    /// Generate a cap mesh with about `num_vertices` vertices reaching
    /// `max_zenith_distance_rad` from the pole.
    pub fn new(
        num_vertices: usize,
        max_zenith_distance_rad: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::from_config(&HemisphereConfig::new(num_vertices, max_zenith_distance_rad))
    }

    pub fn from_config(config: &HemisphereConfig) -> Result<Self, ConfigurationError> {
        let _t = Timed::info("Hemisphere geometry");
        let mesh = CapMesh::generate(config)?;
        Ok(Self::build(
            mesh.vertices,
            mesh.faces,
            config.max_zenith_distance(),
            SolidAngleGeometry::default(),
        ))
    }

    /// Build from a pre-built mesh, bypassing generation.
    ///
    /// Every vertex must be a unit vector within tolerance and every face must
    /// reference three distinct existing vertices.
    pub fn from_mesh(
        vertices: Vec<DVec3>,
        faces: Vec<[usize; 3]>,
    ) -> Result<Self, ConfigurationError> {
        if faces.is_empty() {
            return Err(ConfigurationError::EmptyMesh);
        }
        for (index, v) in vertices.iter().enumerate() {
            let norm = v.length();
            if !(UNIT_NORM_MIN..=UNIT_NORM_MAX).contains(&norm) {
                return Err(ConfigurationError::VertexNotOnUnitSphere { index, norm });
            }
        }
        for (face_idx, face) in faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|&&v| v >= vertices.len()) {
                return Err(ConfigurationError::FaceIndexOutOfRange {
                    face: face_idx,
                    vertex,
                });
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(ConfigurationError::DegenerateFace(face_idx));
            }
        }

        let max_zenith_distance_rad = faces
            .iter()
            .flatten()
            .map(|&v| zenith_distance(vertices[v].normalize()))
            .fold(0.0f64, f64::max);

        let _t = Timed::info("Hemisphere geometry from mesh");
        Ok(Self::build(
            vertices,
            faces,
            max_zenith_distance_rad,
            SolidAngleGeometry::default(),
        ))
    }

    /// Recompute the face solid angles with another area model.
    pub fn with_solid_angle_geometry(mut self, geometry: SolidAngleGeometry) -> Self {
        if geometry != self.solid_angle_geometry {
            self.solid_angles = face_solid_angles(&self.vertices, &self.faces, geometry);
            self.solid_angle_geometry = geometry;
        }
        self
    }

    fn build(
        vertices: Vec<DVec3>,
        faces: Vec<[usize; 3]>,
        max_zenith_distance_rad: f64,
        solid_angle_geometry: SolidAngleGeometry,
    ) -> Self {
        let solid_angles = face_solid_angles(&vertices, &faces, solid_angle_geometry);
        let adjacency = AdjacencyMap::build(vertices.len(), &faces);
        let vertex_index = VertexIndex::new(&vertices);
        let ray_index = {
            let mut timer = Timed::debug("Ray-face index");
            let index = RayFaceIndex::new(&vertices, &faces);
            timer.record(index.num_faces());
            index
        };

        log::debug!(
            "geometry: {} vertices, {} faces, {:.6} sr covered",
            vertices.len(),
            faces.len(),
            solid_angles.iter().sum::<f64>()
        );

        Self {
            vertices,
            faces,
            solid_angles,
            solid_angle_geometry,
            max_zenith_distance_rad,
            adjacency,
            vertex_index,
            ray_index,
        }
    }

    /// Face containing `direction`, or `None` if it falls outside the mesh.
    pub fn query(&self, direction: impl Into<Direction>) -> Option<usize> {
        self.ray_index.resolve(direction.into().to_unit())
    }

    /// [`query`](Self::query) for a batch, resolved in parallel.
    pub fn query_many<D>(&self, directions: &[D]) -> Vec<Option<usize>>
    where
        D: Into<Direction> + Copy,
    {
        let units: Vec<DVec3> = directions.iter().map(|&d| d.into().to_unit()).collect();
        self.ray_index.resolve_many(&units)
    }

    /// Faces plausibly intersecting the cone of `half_angle_rad` around `direction`.
    ///
    /// Gathers every vertex within the cone, widened to at least the third
    /// nearest vertex, and returns all faces touching those vertices. Near the
    /// cone boundary this includes faces only partially inside. The result is
    /// never empty and, when `query(direction)` hits, contains that face.
    /// Face indices are returned sorted.
    pub fn query_cone(
        &self,
        direction: impl Into<Direction>,
        half_angle_rad: f64,
    ) -> Result<Vec<usize>, ConfigurationError> {
        if !(half_angle_rad >= 0.0) {
            return Err(ConfigurationError::NegativeHalfAngle(half_angle_rad));
        }
        let direction = direction.into().to_unit();
        check_unit(direction)?;

        let nearest_chord = self
            .vertex_index
            .k_nearest(direction, CONE_NEIGHBORS)
            .iter()
            .map(|n| n.chord)
            .fold(0.0f64, f64::max);
        // Chord length peaks at a half angle of pi.
        let cone_chord = angle_to_chord(half_angle_rad.min(std::f64::consts::PI));
        let radius = cone_chord.max(nearest_chord);

        let mut faces: FxHashSet<usize> = FxHashSet::default();
        for vertex in self.vertex_index.radius_query(direction, radius) {
            faces.extend(self.adjacency.faces(vertex).iter().map(|&f| f as usize));
        }

        let mut faces: Vec<usize> = faces.into_iter().collect();
        faces.sort_unstable();
        Ok(faces)
    }

    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Solid angle (sr) of every face, index-aligned with [`faces`](Self::faces).
    pub fn face_solid_angles(&self) -> &[f64] {
        &self.solid_angles
    }

    pub fn solid_angle_geometry(&self) -> SolidAngleGeometry {
        self.solid_angle_geometry
    }

    /// Solid angle covered by the whole mesh.
    pub fn total_solid_angle(&self) -> f64 {
        self.solid_angles.iter().sum()
    }

    pub fn max_zenith_distance(&self) -> f64 {
        self.max_zenith_distance_rad
    }

    pub fn adjacency(&self) -> &AdjacencyMap {
        &self.adjacency
    }

    /// Bundle the mesh with per-face values for a renderer.
    ///
    /// Returns `None` if `values` is not one value per face.
    pub fn mesh_values<'a>(&'a self, values: Option<&'a [f64]>) -> Option<MeshView<'a>> {
        if values.is_some_and(|v| v.len() != self.faces.len()) {
            return None;
        }
        Some(MeshView {
            vertices: &self.vertices,
            faces: &self.faces,
            values,
        })
    }
}

impl fmt::Display for HemisphereGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HemisphereGeometry(num_vertices={}, max_zenith_distance_rad={:.6})",
            self.vertices.len(),
            self.max_zenith_distance_rad
        )
    }
}
