//! Direction histograms over a shared hemisphere geometry.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{ConfigurationError, SnapshotError};
use crate::geometry::{Direction, HemisphereGeometry};
use crate::snapshot::HistogramSnapshot;

/// Per-face counts of assigned directions plus an overflow counter for misses.
///
/// Counts only grow; [`reset`](Self::reset) is the only way back to zero.
/// The geometry is shared read-only, so several accumulators can be filled
/// on different threads and combined with [`merge`](Self::merge).
#[derive(Clone)]
pub struct HistogramAccumulator {
    geometry: Arc<HemisphereGeometry>,
    bin_counts: Vec<u64>,
    overflow: u64,
}

impl HistogramAccumulator {
    pub fn new(geometry: Arc<HemisphereGeometry>) -> Self {
        let num_faces = geometry.num_faces();
        Self {
            geometry,
            bin_counts: vec![0; num_faces],
            overflow: 0,
        }
    }

    /// Restore an accumulator from a snapshot taken on the same mesh.
    pub fn from_snapshot(
        geometry: Arc<HemisphereGeometry>,
        snapshot: HistogramSnapshot,
    ) -> Result<Self, SnapshotError> {
        if snapshot.bin_counts.len() != geometry.num_faces() {
            return Err(SnapshotError::LengthMismatch {
                expected: geometry.num_faces(),
                found: snapshot.bin_counts.len(),
            });
        }
        Ok(Self {
            geometry,
            bin_counts: snapshot.bin_counts,
            overflow: snapshot.overflow,
        })
    }

    pub fn geometry(&self) -> &Arc<HemisphereGeometry> {
        &self.geometry
    }

    pub fn bin_counts(&self) -> &[u64] {
        &self.bin_counts
    }

    /// Number of assigned directions that fell outside the mesh.
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Directions assigned since the last reset, overflow included.
    pub fn total_count(&self) -> u64 {
        self.overflow + self.bin_counts.iter().sum::<u64>()
    }

    pub fn reset(&mut self) {
        self.bin_counts.fill(0);
        self.overflow = 0;
    }

    /// Count one direction. Returns the face it landed in.
    pub fn assign_one(&mut self, direction: impl Into<Direction>) -> Option<usize> {
        let face = self.geometry.query(direction);
        match face {
            Some(f) => self.bin_counts[f] += 1,
            None => self.overflow += 1,
        }
        face
    }

    /// Count a batch of directions.
    pub fn assign<D>(&mut self, directions: &[D])
    where
        D: Into<Direction> + Copy,
    {
        for &d in directions {
            self.assign_one(d);
        }
    }

    /// Count a batch on the rayon pool.
    ///
    /// Each worker fills a private count vector; the vectors are summed at the
    /// end, so the result equals [`assign`](Self::assign).
    pub fn assign_par<D>(&mut self, directions: &[D])
    where
        D: Into<Direction> + Copy + Sync,
    {
        let num_faces = self.bin_counts.len();
        let geometry = &self.geometry;
        let (counts, overflow) = directions
            .par_iter()
            .fold(
                || (vec![0u64; num_faces], 0u64),
                |(mut counts, mut overflow), &d| {
                    match geometry.query(d) {
                        Some(f) => counts[f] += 1,
                        None => overflow += 1,
                    }
                    (counts, overflow)
                },
            )
            .reduce(
                || (vec![0u64; num_faces], 0u64),
                |(mut a, oa), (b, ob)| {
                    add_counts(&mut a, &b);
                    (a, oa + ob)
                },
            );
        add_counts(&mut self.bin_counts, &counts);
        self.overflow += overflow;
    }

    /// Add one to every face the cone touches.
    ///
    /// A cone always covers at least one face, so overflow is never touched.
    /// Returns the number of faces incremented.
    pub fn assign_cone(
        &mut self,
        direction: impl Into<Direction>,
        half_angle_rad: f64,
    ) -> Result<usize, ConfigurationError> {
        let faces = self.geometry.query_cone(direction, half_angle_rad)?;
        for &f in &faces {
            self.bin_counts[f] += 1;
        }
        Ok(faces.len())
    }

    /// Add another accumulator's counts into this one.
    pub fn merge(&mut self, other: &HistogramAccumulator) -> Result<(), ConfigurationError> {
        if !Arc::ptr_eq(&self.geometry, &other.geometry) {
            return Err(ConfigurationError::MismatchedGeometry);
        }
        add_counts(&mut self.bin_counts, &other.bin_counts);
        self.overflow += other.overflow;
        Ok(())
    }

    /// Solid angle (sr) of the faces holding at least `threshold` counts.
    ///
    /// A threshold of zero gives the whole mesh regardless of counts.
    pub fn solid_angle(&self, threshold: u64) -> f64 {
        if threshold == 0 {
            return self.geometry.total_solid_angle();
        }
        self.bin_counts
            .iter()
            .zip(self.geometry.face_solid_angles())
            .filter(|&(&count, _)| count >= threshold)
            .map(|(_, &area)| area)
            .sum()
    }

    pub fn to_snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            overflow: self.overflow,
            bin_counts: self.bin_counts.clone(),
        }
    }

    /// Counts scaled to [0, 1] by the largest count; all zero when empty.
    pub fn render_values(&self) -> Vec<f64> {
        let max = self.bin_counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return vec![0.0; self.bin_counts.len()];
        }
        self.bin_counts
            .iter()
            .map(|&c| c as f64 / max as f64)
            .collect()
    }
}

fn add_counts(into: &mut [u64], from: &[u64]) {
    for (a, b) in into.iter_mut().zip(from) {
        *a += b;
    }
}

impl fmt::Display for HistogramAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HistogramAccumulator(num_vertices={}, max_zenith_distance_rad={:.6})",
            self.geometry.num_vertices(),
            self.geometry.max_zenith_distance()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::random_cap_directions;
    use glam::DVec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::FRAC_PI_2;

    fn octant_geometry() -> Arc<HemisphereGeometry> {
        let vertices = vec![DVec3::Z, DVec3::X, DVec3::Y, -DVec3::X, -DVec3::Y];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        Arc::new(HemisphereGeometry::from_mesh(vertices, faces).unwrap())
    }

    #[test]
    fn test_assign_counts_and_overflow() {
        let mut hist = HistogramAccumulator::new(octant_geometry());
        let up_right = DVec3::new(1.0, 1.0, 1.0).normalize();
        let down = DVec3::new(0.2, 0.1, -1.0).normalize();

        hist.assign(&[up_right, up_right, down]);
        assert_eq!(hist.bin_counts(), &[2, 0, 0, 0]);
        assert_eq!(hist.overflow(), 1);
        assert_eq!(hist.total_count(), 3);

        assert_eq!(hist.assign_one(DVec3::new(-1.0, 1.0, 1.0).normalize()), Some(1));
        assert_eq!(hist.bin_counts(), &[2, 1, 0, 0]);
    }

    #[test]
    fn test_solid_angle_thresholds() {
        let mut hist = HistogramAccumulator::new(octant_geometry());
        let octant = FRAC_PI_2;
        hist.assign(&[
            DVec3::new(1.0, 1.0, 1.0).normalize(),
            DVec3::new(1.0, 1.0, 1.0).normalize(),
            DVec3::new(-1.0, -1.0, 1.0).normalize(),
        ]);
        assert!((hist.solid_angle(0) - 4.0 * octant).abs() < 1e-9);
        assert!((hist.solid_angle(1) - 2.0 * octant).abs() < 1e-9);
        assert!((hist.solid_angle(2) - octant).abs() < 1e-9);
        assert_eq!(hist.solid_angle(3), 0.0);

        hist.reset();
        assert_eq!(hist.solid_angle(1), 0.0);
        assert_eq!(hist.total_count(), 0);
        assert!((hist.solid_angle(0) - 4.0 * octant).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let geometry = Arc::new(HemisphereGeometry::new(300, 1.3).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let dirs = random_cap_directions(5000, FRAC_PI_2, &mut rng);

        let mut seq = HistogramAccumulator::new(geometry.clone());
        seq.assign(&dirs);
        let mut par = HistogramAccumulator::new(geometry);
        par.assign_par(&dirs);

        assert_eq!(seq.to_snapshot(), par.to_snapshot());
        assert_eq!(par.total_count(), 5000);
        assert!(par.overflow() > 0);
    }

    #[test]
    fn test_merge() {
        let geometry = octant_geometry();
        let mut a = HistogramAccumulator::new(geometry.clone());
        let mut b = HistogramAccumulator::new(geometry);
        a.assign(&[DVec3::new(1.0, 1.0, 1.0).normalize()]);
        b.assign(&[
            DVec3::new(1.0, 1.0, 1.0).normalize(),
            DVec3::new(0.0, 0.0, -1.0),
        ]);
        a.merge(&b).unwrap();
        assert_eq!(a.bin_counts(), &[2, 0, 0, 0]);
        assert_eq!(a.overflow(), 1);

        let other = HistogramAccumulator::new(octant_geometry());
        assert_eq!(a.merge(&other), Err(ConfigurationError::MismatchedGeometry));
    }

    #[test]
    fn test_assign_cone_counts_each_face_once() {
        let mut hist = HistogramAccumulator::new(octant_geometry());
        let n = hist.assign_cone(DVec3::Z, 0.0).unwrap();
        // Every octant touches the pole.
        assert_eq!(n, 4);
        assert_eq!(hist.bin_counts(), &[1, 1, 1, 1]);
        assert_eq!(hist.overflow(), 0);

        assert!(hist.assign_cone(DVec3::Z, -1.0).is_err());
        assert_eq!(hist.bin_counts(), &[1, 1, 1, 1]);
    }

    #[test]
    fn test_snapshot_restore() {
        let geometry = octant_geometry();
        let mut hist = HistogramAccumulator::new(geometry.clone());
        hist.assign(&[DVec3::new(-1.0, -1.0, 1.0).normalize(), -DVec3::Z]);

        let snapshot = hist.to_snapshot();
        assert_eq!(snapshot.bin_counts, vec![0, 0, 1, 0]);
        assert_eq!(snapshot.overflow, 1);

        let restored = HistogramAccumulator::from_snapshot(geometry.clone(), snapshot).unwrap();
        assert_eq!(restored.bin_counts(), hist.bin_counts());

        let short = HistogramSnapshot {
            overflow: 0,
            bin_counts: vec![1, 2],
        };
        assert!(matches!(
            HistogramAccumulator::from_snapshot(geometry, short),
            Err(SnapshotError::LengthMismatch {
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn test_render_values() {
        let mut hist = HistogramAccumulator::new(octant_geometry());
        assert_eq!(hist.render_values(), vec![0.0; 4]);
        let d = DVec3::new(1.0, 1.0, 1.0).normalize();
        hist.assign(&[d, d, d, d, DVec3::new(-1.0, 1.0, 1.0).normalize()]);
        assert_eq!(hist.render_values(), vec![1.0, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_display() {
        let hist = HistogramAccumulator::new(octant_geometry());
        assert!(hist
            .to_string()
            .starts_with("HistogramAccumulator(num_vertices=5, max_zenith_distance_rad=1.57"));
    }
}
