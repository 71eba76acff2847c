use glam::DVec3;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::error::ConfigurationError;

/// A point projected onto the xy-plane, remembering which vertex it came from.
struct ProjectedVertex {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for ProjectedVertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Delaunay triangulation of unit vectors projected onto the xy-plane.
///
/// Dropping z is safe on the upper hemisphere because z is monotonic in the
/// zenith distance there, so the projection is one-to-one.
#[derive(Debug)]
pub struct PlanarDelaunay {
    /// Triangles as indices into the original point array.
    pub triangles: Vec<[usize; 3]>,
}

impl PlanarDelaunay {
    pub fn compute(points: &[DVec3]) -> Result<Self, ConfigurationError> {
        let projected: Vec<ProjectedVertex> = points
            .iter()
            .enumerate()
            .map(|(index, p)| ProjectedVertex {
                position: Point2::new(p.x, p.y),
                index,
            })
            .collect();

        let triangulation: DelaunayTriangulation<ProjectedVertex> =
            DelaunayTriangulation::bulk_load(projected)
                .map_err(|e| ConfigurationError::Triangulation(format!("{:?}", e)))?;

        let triangles = triangulation
            .inner_faces()
            .map(|face| {
                let [a, b, c] = face.vertices();
                [a.data().index, b.data().index, c.data().index]
            })
            .collect();

        Ok(PlanarDelaunay { triangles })
    }
}
