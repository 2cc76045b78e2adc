//! Correction configuration.

use crate::error::{CorrectionError, CorrectionResult};
use dewarp_transform::{EstimateOptions, Interpolation, WarpFill, WarpOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a correction session and its output.
///
/// Missing fields in a JSON file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Committed lines required before finalizing (at least 2).
    pub min_lines: usize,
    /// Resampling method of the warp.
    pub interpolation: Interpolation,
    /// Fill for output pixels with no source data.
    pub fill: WarpFill,
    /// Maximum refinement iterations of the estimator (0 disables).
    pub refine_iterations: usize,
    /// Relative singular-value threshold of the estimator.
    pub rank_tolerance: f64,
    /// Where the rectified image is written by default.
    pub output_path: PathBuf,
    /// JPEG quality for JPEG output (1-100).
    pub jpeg_quality: u8,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            min_lines: 2,
            interpolation: Interpolation::Bilinear,
            fill: WarpFill::Black,
            refine_iterations: 20,
            rank_tolerance: 1e-10,
            output_path: PathBuf::from("rectified.png"),
            jpeg_quality: 90,
        }
    }
}

impl CorrectionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> CorrectionResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CorrectionError::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> CorrectionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CorrectionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> CorrectionResult<()> {
        // two lines give the four correspondences a homography needs
        if self.min_lines < 2 {
            return Err(CorrectionError::Config(format!(
                "min_lines must be at least 2, got {}",
                self.min_lines
            )));
        }
        if !self.rank_tolerance.is_finite() || self.rank_tolerance < 0.0 {
            return Err(CorrectionError::Config(format!(
                "rank_tolerance must be finite and non-negative, got {}",
                self.rank_tolerance
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CorrectionError::Config(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Estimator options derived from this configuration.
    pub fn estimate_options(&self) -> EstimateOptions {
        EstimateOptions {
            refine_iterations: self.refine_iterations,
            rank_tolerance: self.rank_tolerance,
        }
    }

    /// Warp options derived from this configuration.
    pub fn warp_options(&self) -> WarpOptions {
        WarpOptions {
            interpolation: self.interpolation,
            fill: self.fill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = CorrectionConfig::default();
        assert_eq!(c.min_lines, 2);
        assert_eq!(c.interpolation, Interpolation::Bilinear);
        assert_eq!(c.fill, WarpFill::Black);
        assert_eq!(c.output_path, PathBuf::from("rectified.png"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c = CorrectionConfig::from_json_str(
            r#"{"min_lines": 3, "interpolation": "nearest", "fill": "white"}"#,
        )
        .unwrap();
        assert_eq!(c.min_lines, 3);
        assert_eq!(c.interpolation, Interpolation::Nearest);
        assert_eq!(c.fill, WarpFill::White);
        assert_eq!(c.refine_iterations, 20);
        assert_eq!(c.jpeg_quality, 90);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CorrectionConfig::from_json_str(r#"{"min_lines": 1}"#),
            Err(CorrectionError::Config(_))
        ));
        assert!(matches!(
            CorrectionConfig::from_json_str(r#"{"jpeg_quality": 0}"#),
            Err(CorrectionError::Config(_))
        ));
        assert!(matches!(
            CorrectionConfig::from_json_str("not json"),
            Err(CorrectionError::Config(_))
        ));
    }

    #[test]
    fn test_derived_options() {
        let c = CorrectionConfig {
            refine_iterations: 0,
            fill: WarpFill::Transparent,
            ..Default::default()
        };
        assert_eq!(c.estimate_options().refine_iterations, 0);
        assert_eq!(c.warp_options().fill, WarpFill::Transparent);
    }
}
