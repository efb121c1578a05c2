//! Double compression detection.
//!
//! A second lossy pass re-quantizes transform coefficients that were
//! already quantized once, leaving periodic peaks in their histogram.
//! The detector histograms the magnitudes of a full-image DCT into 100
//! bins and looks for more than a handful of evenly spaced local maxima.

use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Technique};
use crate::core::raster::fit_within;
use crate::core::signal::transform::dct2;
use crate::core::signal::{histogram, local_maxima, std_dev, Plane};
use crate::error::DetectorError;

const HISTOGRAM_BINS: usize = 100;
const TRIGGER_SCORE: f64 = 0.7;

/// Double compression detector
pub struct DoubleCompressionDetector;

impl DoubleCompressionDetector {
    /// Local maxima of the coefficient-magnitude histogram
    pub fn histogram_peaks(magnitudes: &[f64]) -> Vec<usize> {
        local_maxima(&histogram(magnitudes, HISTOGRAM_BINS))
    }

    /// Enough peaks, spaced evenly enough
    pub fn is_periodic(peaks: &[usize], thresholds: &ThresholdConfig) -> bool {
        if peaks.len() <= thresholds.double_compression_min_peaks || peaks.len() < 2 {
            return false;
        }
        let spacing: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        std_dev(&spacing) < thresholds.double_compression_max_spacing_stdev
    }
}

impl Detector for DoubleCompressionDetector {
    fn technique(&self) -> Technique {
        Technique::DoubleCompression
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let luma = input.image.luma();
        let gray = match thresholds.spectral_cap() {
            Some(side) => fit_within(&luma, side, Technique::DoubleCompression)?,
            None => luma,
        };
        let coefficients = dct2(&Plane::from_gray(&gray));
        let magnitudes: Vec<f64> = coefficients.data().iter().map(|c| c.abs()).collect();

        let peaks = Self::histogram_peaks(&magnitudes);
        debug!(
            peaks = peaks.len(),
            width = gray.width(),
            height = gray.height(),
            "double compression histogram"
        );

        if Self::is_periodic(&peaks, thresholds) {
            Ok(Finding::triggered(
                Technique::DoubleCompression,
                TRIGGER_SCORE,
                format!(
                    "Double JPEG compression detected. Found {} periodic peaks",
                    peaks.len()
                ),
            ))
        } else {
            Ok(Finding::clear(
                Technique::DoubleCompression,
                "No double JPEG compression detected",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::MetadataTags;
    use crate::core::raster::{ChannelLayout, RasterImage};

    fn periodic_magnitudes() -> Vec<f64> {
        let mut values = vec![0.0, 100.0];
        for k in 1..=9 {
            values.extend(std::iter::repeat(k as f64 * 10.0 + 0.5).take(5));
        }
        values
    }

    #[test]
    fn evenly_spaced_peaks_are_periodic() {
        let peaks = DoubleCompressionDetector::histogram_peaks(&periodic_magnitudes());
        assert_eq!(peaks, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert!(DoubleCompressionDetector::is_periodic(
            &peaks,
            &ThresholdConfig::default()
        ));
    }

    #[test]
    fn irregular_peaks_are_not_periodic() {
        let peaks = vec![2, 3, 30, 31, 70, 95, 97];
        assert!(!DoubleCompressionDetector::is_periodic(
            &peaks,
            &ThresholdConfig::default()
        ));
    }

    #[test]
    fn five_peaks_are_not_enough() {
        let peaks = vec![10, 20, 30, 40, 50];
        assert!(!DoubleCompressionDetector::is_periodic(
            &peaks,
            &ThresholdConfig::default()
        ));
    }

    #[test]
    fn flat_image_is_not_double_compressed() {
        let raster = RasterImage::new(64, 48, ChannelLayout::Gray, vec![77; 64 * 48]).unwrap();
        let tags = MetadataTags::absent();
        let finding = DoubleCompressionDetector
            .detect(&DetectionInput::new(&raster, &tags), &ThresholdConfig::default())
            .unwrap();
        assert!(!finding.triggered);
        assert_eq!(finding.score, 0.0);
    }
}
