//! Near-equal solid angle binning of directions over a hemispherical cap.
//!
//! A [`HemisphereGeometry`] triangulates the cap of the unit sphere up to a
//! maximum zenith distance into faces of roughly equal solid angle. A
//! [`HistogramAccumulator`] bound to it counts how many directions fall into
//! each face, either exactly (one direction, one face) or as cones that touch
//! a neighborhood of faces.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hemisphere_histogram::{Direction, HemisphereGeometry, HistogramAccumulator};
//!
//! let geometry = Arc::new(HemisphereGeometry::new(2047, 89f64.to_radians())?);
//! let mut hist = HistogramAccumulator::new(geometry);
//! hist.assign(&[Direction::azimuth_zenith(0.3, 0.2)]);
//! hist.assign_cone(Direction::cx_cy(0.1, 0.0), 5f64.to_radians())?;
//! println!("{} sr touched", hist.solid_angle(1));
//! # Ok::<(), hemisphere_histogram::ConfigurationError>(())
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod snapshot;
pub mod util;

pub use config::HemisphereConfig;
pub use error::{ConfigurationError, ObjError, SnapshotError};
pub use geometry::{Direction, HemisphereGeometry, MeshView, SolidAngleGeometry};
pub use histogram::HistogramAccumulator;
pub use snapshot::HistogramSnapshot;
