use glam::DVec3;
use rand::Rng;

use crate::constants::{UNIT_NORM_MAX, UNIT_NORM_MIN};
use crate::error::ConfigurationError;

/// A direction in one of the accepted encodings.
///
/// All three encodings describe the same physical direction and resolve to
/// the same face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// Unit vector (cx, cy, cz).
    Unit(DVec3),
    /// Azimuth and zenith distance in radians.
    AzimuthZenith { azimuth_rad: f64, zenith_rad: f64 },
    /// Direction cosines in x and y; cz is restored as the positive root.
    /// Only valid for the upper hemisphere.
    CxCy { cx: f64, cy: f64 },
}

impl Direction {
    pub fn azimuth_zenith(azimuth_rad: f64, zenith_rad: f64) -> Self {
        Direction::AzimuthZenith {
            azimuth_rad,
            zenith_rad,
        }
    }

    pub fn cx_cy(cx: f64, cy: f64) -> Self {
        Direction::CxCy { cx, cy }
    }

    /// Cartesian form of this direction.
    pub fn to_unit(self) -> DVec3 {
        match self {
            Direction::Unit(v) => v,
            Direction::AzimuthZenith {
                azimuth_rad,
                zenith_rad,
            } => az_zd_to_unit(azimuth_rad, zenith_rad),
            Direction::CxCy { cx, cy } => DVec3::new(cx, cy, restore_cz(cx, cy)),
        }
    }
}

impl From<DVec3> for Direction {
    fn from(v: DVec3) -> Self {
        Direction::Unit(v)
    }
}

impl From<[f64; 3]> for Direction {
    fn from(v: [f64; 3]) -> Self {
        Direction::Unit(DVec3::from_array(v))
    }
}

/// Unit vector for an azimuth and zenith distance (radians).
pub fn az_zd_to_unit(azimuth_rad: f64, zenith_rad: f64) -> DVec3 {
    let (sin_az, cos_az) = azimuth_rad.sin_cos();
    let (sin_zd, cos_zd) = zenith_rad.sin_cos();
    DVec3::new(cos_az * sin_zd, sin_az * sin_zd, cos_zd)
}

/// Azimuth in (-pi, pi] and zenith distance in [0, pi] of a vector.
pub fn unit_to_az_zd(v: DVec3) -> (f64, f64) {
    (v.y.atan2(v.x), zenith_distance(v))
}

/// Positive z completing (cx, cy) to a unit vector. Clamped to zero outside the unit disc.
pub fn restore_cz(cx: f64, cy: f64) -> f64 {
    (1.0 - cx * cx - cy * cy).max(0.0).sqrt()
}

/// Zenith distance of a unit vector.
#[inline]
pub fn zenith_distance(v: DVec3) -> f64 {
    v.x.hypot(v.y).atan2(v.z)
}

/// Chord length between two unit vectors separated by `angle_rad`.
#[inline]
pub fn angle_to_chord(angle_rad: f64) -> f64 {
    2.0 * (0.5 * angle_rad).sin()
}

/// Angle subtended by a chord of the unit sphere.
#[inline]
pub fn chord_to_angle(chord: f64) -> f64 {
    2.0 * (0.5 * chord).clamp(-1.0, 1.0).asin()
}

/// Solid angle (steradians) of a cap reaching `max_zenith_distance_rad` from the pole.
pub fn cap_solid_angle(max_zenith_distance_rad: f64) -> f64 {
    // 2pi(1 - cos Z), written in the half angle.
    let half_sin = (0.5 * max_zenith_distance_rad).sin();
    2.0 * std::f64::consts::TAU * half_sin * half_sin
}

/// Reject vectors whose norm is outside the unit tolerance.
pub fn check_unit(v: DVec3) -> Result<(), ConfigurationError> {
    let norm = v.length();
    if (UNIT_NORM_MIN..=UNIT_NORM_MAX).contains(&norm) {
        Ok(())
    } else {
        Err(ConfigurationError::NonUnitDirection { norm })
    }
}

/// Generate `n` points on the cap with a golden-angle spiral.
///
/// The enclosed cap area grows in equal steps from the pole outwards, which
/// gives every point the same share of the cap. The points stay strictly
/// inside the cap.
pub fn fibonacci_cap_points(n: usize, max_zenith_distance_rad: f64) -> Vec<DVec3> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
    (0..n)
        .map(|i| {
            let area_fraction = (i as f64 + 0.5) / n as f64;
            let zenith = zenith_at_area_fraction(area_fraction, max_zenith_distance_rad);
            az_zd_to_unit(golden_angle * i as f64, zenith)
        })
        .collect()
}

/// Generate `n` uniformly distributed random directions on the cap.
pub fn random_cap_directions<R: Rng>(
    n: usize,
    max_zenith_distance_rad: f64,
    rng: &mut R,
) -> Vec<DVec3> {
    (0..n)
        .map(|_| {
            let area_fraction: f64 = rng.gen_range(0.0..=1.0);
            let azimuth: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            az_zd_to_unit(
                azimuth,
                zenith_at_area_fraction(area_fraction, max_zenith_distance_rad),
            )
        })
        .collect()
}

/// Zenith distance enclosing `fraction` of the cap's area.
///
/// Inverts `sin^2(zd/2) = fraction * sin^2(Z/2)`, which stays exact for tiny caps.
fn zenith_at_area_fraction(fraction: f64, max_zenith_distance_rad: f64) -> f64 {
    let half_sin = fraction.sqrt() * (0.5 * max_zenith_distance_rad).sin();
    2.0 * half_sin.clamp(0.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fibonacci_points_inside_cap() {
        let max_zd = 60f64.to_radians();
        let points = fibonacci_cap_points(500, max_zd);
        assert_eq!(points.len(), 500);
        for p in &points {
            assert!((p.length() - 1.0).abs() < 1e-12, "not unit: {}", p.length());
            assert!(zenith_distance(*p) < max_zd);
        }
    }

    #[test]
    fn test_encodings_agree() {
        let az = 0.7;
        let zd = 0.4;
        let v = az_zd_to_unit(az, zd);
        let from_az_zd = Direction::azimuth_zenith(az, zd).to_unit();
        let from_cx_cy = Direction::cx_cy(v.x, v.y).to_unit();
        assert!((from_az_zd - v).length() < 1e-12);
        assert!((from_cx_cy - v).length() < 1e-12);

        let (az2, zd2) = unit_to_az_zd(v);
        assert!((az2 - az).abs() < 1e-12);
        assert!((zd2 - zd).abs() < 1e-12);
    }

    #[test]
    fn test_chord_angle_inverse() {
        for deg in [0.0, 1.0, 15.0, 90.0, 179.0] {
            let a = f64::to_radians(deg);
            assert!((chord_to_angle(angle_to_chord(a)) - a).abs() < 1e-9);
        }
    }

    #[test]
    fn test_check_unit() {
        assert!(check_unit(DVec3::Z).is_ok());
        assert!(check_unit(DVec3::new(0.0, 0.0, 1.005)).is_ok());
        assert!(matches!(
            check_unit(DVec3::new(0.0, 0.0, 1.2)),
            Err(ConfigurationError::NonUnitDirection { .. })
        ));
    }

    #[test]
    fn test_tiny_caps() {
        for max_zd in [1e-6, 1e-8, 1e-12] {
            let area = cap_solid_angle(max_zd);
            let small_angle = std::f64::consts::PI * max_zd * max_zd;
            assert!(area > 0.0);
            assert!((area - small_angle).abs() / small_angle < 1e-6);

            let points = fibonacci_cap_points(50, max_zd);
            for pair in points.windows(2) {
                assert!(pair[0] != pair[1], "spiral collapsed at Z = {}", max_zd);
            }
            for p in &points {
                assert!(zenith_distance(*p) < max_zd);
                assert!(zenith_distance(*p) > 0.0);
            }
        }
        let hemisphere = cap_solid_angle(std::f64::consts::FRAC_PI_2);
        assert!((hemisphere - std::f64::consts::TAU).abs() < 1e-12);
    }

    #[test]
    fn test_random_directions_inside_cap() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let max_zd = 30f64.to_radians();
        for d in random_cap_directions(200, max_zd, &mut rng) {
            assert!((d.length() - 1.0).abs() < 1e-12);
            assert!(zenith_distance(d) <= max_zd + 1e-12);
        }
    }
}
