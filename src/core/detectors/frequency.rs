//! Frequency-domain analysis.
//!
//! Looks at `ln(1 + |F|)` of the full-resolution DFT over the central
//! quadrant of the unshifted spectrum, i.e. the band of highest spatial
//! frequencies, which keeps the DC term and the low-frequency scene content
//! out. Magnitudes are not normalized by the pixel count, so the ratio
//! `std / mean` stays on the log scale the thresholds are calibrated for
//! (any constant gain such as `20 * ln` cancels). A band that is too even
//! hints at smoothing or inpainting; one dominated by a few spikes hints at
//! a splice boundary or resampling.

use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Severity, Technique};
use crate::core::raster::fit_within;
use crate::core::signal::transform::dft_magnitude;
use crate::core::signal::{mean, std_dev, Plane};
use crate::error::DetectorError;

const TRIGGER_SCORE: f64 = 0.6;
/// Mean log magnitude below which the band counts as empty
const SPECTRUM_EPSILON: f64 = 1e-9;

/// Frequency-domain detector
pub struct FrequencyDomainDetector;

/// How the high-frequency band deviates, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumShape {
    Normal,
    Uniform,
    Irregular,
}

impl FrequencyDomainDetector {
    /// Mean and standard deviation of the high-frequency log spectrum
    pub fn band_statistics(gray: &Plane) -> Result<(f64, f64), DetectorError> {
        let (width, height) = (gray.width(), gray.height());
        let (x0, x1) = (width / 4, 3 * width / 4);
        let (y0, y1) = (height / 4, 3 * height / 4);
        if x1 <= x0 || y1 <= y0 {
            return Err(DetectorError::TooSmall {
                technique: Technique::FrequencyDomain,
                required: 4,
                width: width as u32,
                height: height as u32,
            });
        }

        let magnitude = dft_magnitude(gray);
        let band: Vec<f64> = magnitude
            .crop(x0, y0, x1 - x0, y1 - y0)
            .data()
            .iter()
            .map(|m| m.ln_1p())
            .collect();
        Ok((mean(&band), std_dev(&band)))
    }

    pub fn classify(mean: f64, std: f64, thresholds: &ThresholdConfig) -> SpectrumShape {
        if mean < SPECTRUM_EPSILON {
            SpectrumShape::Normal
        } else if std > mean * thresholds.frequency_irregular_ratio {
            SpectrumShape::Irregular
        } else if std < mean * thresholds.frequency_uniform_ratio {
            SpectrumShape::Uniform
        } else {
            SpectrumShape::Normal
        }
    }
}

impl Detector for FrequencyDomainDetector {
    fn technique(&self) -> Technique {
        Technique::FrequencyDomain
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let luma = input.image.luma();
        let gray = match thresholds.spectral_cap() {
            Some(side) => fit_within(&luma, side, Technique::FrequencyDomain)?,
            None => luma,
        };
        let (band_mean, band_std) = Self::band_statistics(&Plane::from_gray(&gray))?;
        let shape = Self::classify(band_mean, band_std, thresholds);
        debug!(band_mean, band_std, ?shape, "frequency spectrum");

        let finding = match shape {
            SpectrumShape::Normal => Finding::clear(
                Technique::FrequencyDomain,
                "Frequency analysis normal",
            ),
            SpectrumShape::Irregular => Finding::triggered(
                Technique::FrequencyDomain,
                TRIGGER_SCORE,
                format!(
                    "Irregular high-frequency spectrum (std {:.4} vs mean {:.4}), possible splice boundary",
                    band_std, band_mean
                ),
            )
            .with_severity(Severity::High),
            SpectrumShape::Uniform => Finding::triggered(
                Technique::FrequencyDomain,
                TRIGGER_SCORE,
                format!(
                    "Over-uniform high-frequency spectrum (std {:.4} vs mean {:.4}), possible smoothing",
                    band_std, band_mean
                ),
            )
            .with_severity(Severity::Medium),
        };
        Ok(finding)
    }
}
