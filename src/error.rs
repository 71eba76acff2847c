//! Error types.

use thiserror::Error;

/// Invalid construction or query parameters.
///
/// Raised at the call that introduced the bad input; nothing is retried and no
/// partially built geometry is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("max zenith distance must be in (0, pi/2], got {0} rad")]
    InvalidMaxZenithDistance(f64),

    #[error("number of vertices must be positive")]
    InvalidVertexCount,

    #[error("expected solid angle geometry 'spherical' or 'flat', got '{0}'")]
    UnknownSolidAngleGeometry(String),

    #[error("cone half angle must be non-negative, got {0} rad")]
    NegativeHalfAngle(f64),

    #[error("direction is not a unit vector (norm = {norm})")]
    NonUnitDirection { norm: f64 },

    #[error("vertex {index} is not on the unit sphere (norm = {norm})")]
    VertexNotOnUnitSphere { index: usize, norm: f64 },

    #[error("face {face} references vertex {vertex} which does not exist")]
    FaceIndexOutOfRange { face: usize, vertex: usize },

    #[error("face {0} does not have three distinct vertices")]
    DegenerateFace(usize),

    #[error("mesh has no faces")]
    EmptyMesh,

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("histograms are bound to different geometries")]
    MismatchedGeometry,
}

/// Failure while reading a wavefront mesh.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("no faces found for material '{0}'")]
    MissingMaterial(String),
}

/// Failure while persisting or restoring a histogram snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot has {found} bins but the geometry has {expected} faces")]
    LengthMismatch { expected: usize, found: usize },
}
