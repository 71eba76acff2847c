//! Construction parameters for a hemisphere geometry.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_ZENITH_DISTANCE_DEG, DEFAULT_NUM_VERTICES, ZENITH_ROUNDING_SLACK,
};
use crate::error::ConfigurationError;

/// Parameters for generating a hemisphere mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereConfig {
    /// Guideline for the number of vertices. The final count differs because
    /// of the horizon ring and dropped interior points.
    pub num_vertices: usize,
    /// Vertices are only placed up to this zenith distance (radians); the
    /// horizon ring sits exactly on it.
    pub max_zenith_distance_rad: f64,
}

impl Default for HemisphereConfig {
    fn default() -> Self {
        Self {
            num_vertices: DEFAULT_NUM_VERTICES,
            max_zenith_distance_rad: DEFAULT_MAX_ZENITH_DISTANCE_DEG.to_radians(),
        }
    }
}

impl HemisphereConfig {
    pub fn new(num_vertices: usize, max_zenith_distance_rad: f64) -> Self {
        Self {
            num_vertices,
            max_zenith_distance_rad,
        }
    }

    pub fn from_degrees(num_vertices: usize, max_zenith_distance_deg: f64) -> Self {
        Self::new(num_vertices, max_zenith_distance_deg.to_radians())
    }

    /// Zenith distance clamped to pi/2.
    pub fn max_zenith_distance(&self) -> f64 {
        self.max_zenith_distance_rad.min(std::f64::consts::FRAC_PI_2)
    }

    /// Check that the vertex count is positive and the zenith distance is in (0, pi/2].
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_vertices == 0 {
            return Err(ConfigurationError::InvalidVertexCount);
        }
        let zd = self.max_zenith_distance_rad;
        // Degree conversions of 90 may land an ulp above pi/2.
        if !(zd > 0.0 && zd <= std::f64::consts::FRAC_PI_2 + ZENITH_ROUNDING_SLACK) {
            return Err(ConfigurationError::InvalidMaxZenithDistance(zd));
        }
        Ok(())
    }
}
