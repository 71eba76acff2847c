mod delaunay;
mod faces;
mod hemisphere;
mod mesh;
pub mod obj;
mod ray_index;
mod sphere;
pub mod triangle;
mod vertex_index;

pub use delaunay::PlanarDelaunay;
pub use faces::*;
pub use hemisphere::{HemisphereGeometry, MeshView};
pub use mesh::*;
pub use ray_index::{face_ids_with_sentinel, RayFaceIndex};
pub use sphere::*;
pub use vertex_index::{VertexDistance, VertexIndex};
