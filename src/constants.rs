//! Tolerances and defaults for mesh construction and queries.

/// Default guideline for the number of mesh vertices.
pub const DEFAULT_NUM_VERTICES: usize = 2047;

/// Default maximum zenith distance (degrees).
pub const DEFAULT_MAX_ZENITH_DISTANCE_DEG: f64 = 89.0;

/// Slack above pi/2 accepted for the maximum zenith distance.
pub const ZENITH_ROUNDING_SLACK: f64 = 1e-12;

/// Lower bound on the norm of a direction or vertex treated as a unit vector.
pub const UNIT_NORM_MIN: f64 = 0.99;

/// Upper bound on the norm of a direction or vertex treated as a unit vector.
pub const UNIT_NORM_MAX: f64 = 1.01;

/// Number of nearest vertices whose spread sets the minimum cone radius.
pub const CONE_NEIGHBORS: usize = 3;

/// Expected number of faces per vertex of a planar triangulation.
pub const FACES_PER_VERTEX: f64 = 2.0;

/// Minimum number of vertices on the horizon ring.
pub const MIN_RING_VERTICES: usize = 3;

/// Rays count as parallel to a triangle when the Möller-Trumbore determinant,
/// relative to the product of the two edge lengths, falls below this.
pub const RAY_PARALLEL_EPSILON: f64 = 1e-14;

/// Barycentric slack so rays through shared edges still hit a face.
pub const RAY_EDGE_EPSILON: f64 = 1e-12;

/// Maximum number of triangles stored in one BVH leaf.
pub const BVH_MAX_LEAF_FACES: usize = 4;

/// Integer encoding of a miss for consumers that cannot take `Option`.
pub const MISS_SENTINEL: i64 = -1;
