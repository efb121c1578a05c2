//! Splicing detection via lighting consistency.
//!
//! Content pasted from another photo rarely shares the scene's
//! illumination. The detector averages perceptual lightness over 32x32
//! blocks and flags a high coefficient of variation across them.

use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Technique};
use crate::core::signal::color::lightness;
use crate::core::signal::{coefficient_of_variation, mean};
use crate::error::DetectorError;

const BLOCK: usize = 32;

/// Splicing detector
pub struct SplicingDetector;

impl Detector for SplicingDetector {
    fn technique(&self) -> Technique {
        Technique::Splicing
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let blocks = lightness(&input.image.to_rgb()).blocks(BLOCK);
        if blocks.is_empty() {
            return Err(DetectorError::TooSmall {
                technique: Technique::Splicing,
                required: BLOCK as u32,
                width: input.image.width(),
                height: input.image.height(),
            });
        }

        let means: Vec<f64> = blocks.iter().map(|block| mean(block.data())).collect();
        let variation = coefficient_of_variation(&means);
        debug!(blocks = means.len(), variation, "splicing lighting");

        if variation > thresholds.splicing_variation {
            Ok(Finding::triggered(
                Technique::Splicing,
                variation,
                format!("Lighting inconsistencies detected (CV: {:.3})", variation),
            ))
        } else {
            Ok(Finding::clear(
                Technique::Splicing,
                format!("Lighting appears consistent (CV: {:.3})", variation),
            ))
        }
    }
}
