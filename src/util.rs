//! Timing helper for construction phases.

use std::time::{Duration, Instant};

/// Scope timer for one build phase, reported through `log` when dropped.
///
/// ```ignore
/// let mut timer = Timed::debug("Ray-face index");
/// let index = RayFaceIndex::new(&vertices, &faces);
/// timer.record(index.num_faces());
/// // DEBUG "Ray-face index: 1.234ms (4000 items, 3.2M/s)"
/// ```
pub struct Timed {
    phase: &'static str,
    level: log::Level,
    started: Instant,
    items: Option<usize>,
}

impl Timed {
    pub fn info(phase: &'static str) -> Self {
        Self::at(log::Level::Info, phase)
    }

    pub fn debug(phase: &'static str) -> Self {
        Self::at(log::Level::Debug, phase)
    }

    fn at(level: log::Level, phase: &'static str) -> Self {
        Self {
            phase,
            level,
            started: Instant::now(),
            items: None,
        }
    }

    /// Number of items the phase produced or processed; adds a rate to the report.
    pub fn record(&mut self, items: usize) {
        self.items = Some(items);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        if !log::log_enabled!(self.level) {
            return;
        }
        let elapsed = self.elapsed();
        match self.items {
            Some(n) => {
                let rate = n as f64 / elapsed.as_secs_f64().max(1e-9);
                log::log!(
                    self.level,
                    "{}: {:.3?} ({} items, {})",
                    self.phase,
                    elapsed,
                    n,
                    format_rate(rate)
                );
            }
            None => log::log!(self.level, "{}: {:.3?}", self.phase, elapsed),
        }
    }
}

fn format_rate(per_second: f64) -> String {
    if per_second >= 1e6 {
        format!("{:.1}M/s", per_second / 1e6)
    } else if per_second >= 1e3 {
        format!("{:.1}k/s", per_second / 1e3)
    } else {
        format!("{:.0}/s", per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(3_200_000.0), "3.2M/s");
        assert_eq!(format_rate(4_500.0), "4.5k/s");
        assert_eq!(format_rate(12.0), "12/s");
    }

    #[test]
    fn test_records_items() {
        let mut timer = Timed::debug("phase");
        assert!(timer.items.is_none());
        timer.record(10);
        assert_eq!(timer.items, Some(10));
    }
}
