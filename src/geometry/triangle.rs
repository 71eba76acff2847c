//! Triangle helpers: containment, uniform sampling, zenith crossings.

use glam::DVec3;
use rand::Rng;

use super::sphere::zenith_distance;

/// Upper bound on bisection steps when searching for a zenith crossing.
const MAX_BISECTION_STEPS: usize = 200;

/// Whether `p` lies in the plane of triangle abc and inside it or on an edge.
pub fn is_point_in_triangle(a: DVec3, b: DVec3, c: DVec3, p: DVec3) -> bool {
    let normal = (b - a).cross(c - a);
    let scale = normal.length();
    if scale == 0.0 {
        return false;
    }

    let tolerance = 1e-9 * scale;
    if normal.dot(p - a).abs() > tolerance * (1.0 + (p - a).length()) {
        return false;
    }

    // Inside iff p is on the inner side of all three edges.
    let edges = [(a, b), (b, c), (c, a)];
    edges
        .iter()
        .all(|&(from, to)| (to - from).cross(p - from).dot(normal) >= -tolerance)
}

/// Uniformly distributed random point inside the flat triangle abc.
pub fn draw_point_on_triangle<R: Rng>(rng: &mut R, a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let mut u: f64 = rng.gen_range(0.0..1.0);
    let mut v: f64 = rng.gen_range(0.0..1.0);
    // Reflect samples from the far half of the parallelogram back into the triangle.
    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }
    a + (b - a) * u + (c - a) * v
}

/// Point on the great-circle arc from `a` to `b` at zenith distance `zenith_rad`.
///
/// The result is within `epsilon_rad` of the requested zenith distance.
/// Returns `None` when the zenith distances of `a` and `b` do not bracket
/// `zenith_rad`.
pub fn intermediate_vertex_at_zenith(
    a: DVec3,
    b: DVec3,
    zenith_rad: f64,
    epsilon_rad: f64,
) -> Option<DVec3> {
    let a = a.normalize();
    let b = b.normalize();
    let offset = |v: DVec3| zenith_distance(v) - zenith_rad;

    let offset_a = offset(a);
    if offset_a.abs() < epsilon_rad {
        return Some(a);
    }
    let offset_b = offset(b);
    if offset_b.abs() < epsilon_rad {
        return Some(b);
    }
    if offset_a.signum() == offset_b.signum() {
        return None;
    }

    let point_at = |t: f64| a.lerp(b, t).normalize();
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        let p = point_at(mid);
        let off = offset(p);
        if off.abs() < epsilon_rad {
            return Some(p);
        }
        if off.signum() == offset_a.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(point_at(0.5 * (lo + hi)))
}
