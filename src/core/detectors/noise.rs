//! Noise pattern analysis.
//!
//! The noise residual is the absolute difference between the grayscale
//! image and its 5x5 median. A camera leaves a roughly even residual
//! everywhere; composited content brings its own noise level along, which
//! shows up as spread in the per-block residual variance.

use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Technique};
use crate::core::signal::filters::median_filter;
use crate::core::signal::{mean, safe_ratio, std_dev, variance, Plane};
use crate::error::DetectorError;

const MEDIAN_SIZE: u32 = 5;
const BLOCK: usize = 64;
/// Ratio-to-score scale
const SCORE_SCALE: f64 = 0.3;

/// Noise pattern detector
pub struct NoisePatternDetector;

impl NoisePatternDetector {
    /// Residual variance of every complete block, row by row
    pub fn block_variances(input: &DetectionInput<'_>) -> Result<Vec<f64>, DetectorError> {
        let gray = input.image.luma();
        let residual =
            Plane::from_gray(&gray).abs_diff(&Plane::from_gray(&median_filter(&gray, MEDIAN_SIZE)));

        let blocks = residual.blocks(BLOCK);
        if blocks.is_empty() {
            return Err(DetectorError::TooSmall {
                technique: Technique::NoisePattern,
                required: BLOCK as u32,
                width: gray.width(),
                height: gray.height(),
            });
        }
        Ok(blocks.iter().map(|block| variance(block.data())).collect())
    }
}

impl Detector for NoisePatternDetector {
    fn technique(&self) -> Technique {
        Technique::NoisePattern
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let variances = Self::block_variances(input)?;
        let (mean_var, std_var) = (mean(&variances), std_dev(&variances));
        let ratio = safe_ratio(std_var, mean_var);
        debug!(blocks = variances.len(), mean_var, std_var, "noise pattern");

        if mean_var > 0.0 && std_var > mean_var * thresholds.noise_inconsistency {
            Ok(Finding::triggered(
                Technique::NoisePattern,
                ratio * SCORE_SCALE,
                format!(
                    "Inconsistent noise patterns detected. STD: {:.2}, Mean: {:.2}",
                    std_var, mean_var
                ),
            ))
        } else {
            Ok(Finding::clear(
                Technique::NoisePattern,
                "Noise patterns appear consistent",
            ))
        }
    }
}
