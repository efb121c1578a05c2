//! Error-level analysis.
//!
//! ELA works by:
//! 1. Re-encoding the image as JPEG at a fixed quality (in memory)
//! 2. Taking the per-channel absolute difference to the original
//! 3. Reducing it to one luminance-weighted error level per pixel
//! 4. Equalizing the error map and thresholding it into a mask
//! 5. Keeping connected regions of at least `ela_min_region_area` pixels
//!
//! Regions that were already compressed at this quality barely change,
//! while pasted or retouched content re-quantizes differently.
//!
//! The trigger and the score use the raw error levels; the equalized map
//! always spans the full range and only serves to shape the mask.

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma, RgbImage};
use std::path::Path;
use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Region, Technique};
use crate::core::raster::{rgb_to_luma, FastDecoder};
use crate::core::signal::filters::equalize_histogram;
use crate::core::signal::regions::connected_regions;
use crate::error::DetectorError;

/// Largest number of regions attached to a finding
const MAX_REPORTED_REGIONS: usize = 16;

/// Error-level analysis detector
pub struct ElaDetector;

impl ElaDetector {
    /// Pixels of the original encoding, or the raster itself when no stream was kept
    fn original(input: &DetectionInput<'_>) -> Result<RgbImage, DetectorError> {
        match input.image.source() {
            Some(bytes) => FastDecoder::decode(bytes, Path::new("<source>"))
                .map(|image| image.to_rgb8())
                .map_err(|e| DetectorError::Unreadable {
                    technique: Technique::ErrorLevel,
                    reason: e.to_string(),
                }),
            None => Ok(input.image.to_rgb()),
        }
    }

    /// Luminance-weighted error level of every pixel after one JPEG round trip
    pub fn error_levels(original: &RgbImage, quality: u8) -> Result<GrayImage, DetectorError> {
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, quality)
            .encode_image(original)
            .map_err(|e| DetectorError::Encode {
                technique: Technique::ErrorLevel,
                reason: e.to_string(),
            })?;

        let resaved = FastDecoder::decode(&encoded, Path::new("<ela>"))
            .map_err(|e| DetectorError::Unreadable {
                technique: Technique::ErrorLevel,
                reason: e.to_string(),
            })?
            .to_rgb8();

        if resaved.dimensions() != original.dimensions() {
            return Err(DetectorError::DegenerateInput {
                technique: Technique::ErrorLevel,
                reason: format!(
                    "re-encoded image is {:?}, original is {:?}",
                    resaved.dimensions(),
                    original.dimensions()
                ),
            });
        }

        let (width, height) = original.dimensions();
        Ok(GrayImage::from_fn(width, height, |x, y| {
            let a = original.get_pixel(x, y);
            let b = resaved.get_pixel(x, y);
            Luma([rgb_to_luma(
                a[0].abs_diff(b[0]),
                a[1].abs_diff(b[1]),
                a[2].abs_diff(b[2]),
            )])
        }))
    }

    /// Connected regions of `mask` with at least `min_area` pixels, largest first
    pub fn significant_regions(
        mask: &[bool],
        width: usize,
        height: usize,
        min_area: u32,
    ) -> Vec<Region> {
        let mut regions: Vec<Region> = connected_regions(mask, width, height)
            .into_iter()
            .filter(|r| r.area >= min_area)
            .collect();
        regions.sort_by(|a, b| b.area.cmp(&a.area));
        regions
    }
}

impl Detector for ElaDetector {
    fn technique(&self) -> Technique {
        Technique::ErrorLevel
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let original = Self::original(input)?;
        let levels = Self::error_levels(&original, thresholds.ela_quality)?;
        let max_diff = levels.pixels().map(|p| p[0]).max().unwrap_or(0);

        let equalized = equalize_histogram(&levels);
        let mask: Vec<bool> = equalized
            .pixels()
            .map(|p| p[0] > thresholds.ela_threshold)
            .collect();
        let (width, height) = levels.dimensions();

        let mut regions = Self::significant_regions(
            &mask,
            width as usize,
            height as usize,
            thresholds.ela_min_region_area,
        );

        debug!(
            max_diff,
            regions = regions.len(),
            quality = thresholds.ela_quality,
            "error level analysis"
        );

        if max_diff as f64 > thresholds.ela_min_difference && !regions.is_empty() {
            let count = regions.len();
            regions.truncate(MAX_REPORTED_REGIONS);
            Ok(Finding::triggered(
                Technique::ErrorLevel,
                max_diff as f64 / 100.0,
                format!(
                    "Detected {} regions with inconsistent compression levels. Max difference: {}",
                    count, max_diff
                ),
            )
            .with_regions(regions))
        } else {
            Ok(Finding::clear(
                Technique::ErrorLevel,
                format!(
                    "No significant compression anomalies detected (max difference {})",
                    max_diff
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::MetadataTags;
    use crate::core::raster::{decode_bytes, ChannelLayout, RasterImage};
    use image::Rgb;

    fn jpeg_bytes(image: &RgbImage, quality: u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality)
            .encode_image(image)
            .unwrap();
        bytes
    }

    fn noise_raster(size: u32) -> RasterImage {
        let mut state = 12345u32;
        let pixels = (0..size * size * 3)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect();
        RasterImage::new(size, size, ChannelLayout::Rgb, pixels).unwrap()
    }

    #[test]
    fn flat_jpeg_is_not_triggered() {
        let flat = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let raster = decode_bytes(jpeg_bytes(&flat, 90)).unwrap();
        let tags = MetadataTags::absent();

        let finding = ElaDetector
            .detect(&DetectionInput::new(&raster, &tags), &ThresholdConfig::default())
            .unwrap();

        assert!(!finding.triggered);
        assert_eq!(finding.score, 0.0);
    }

    #[test]
    fn flat_jpeg_round_trip_has_tiny_error() {
        let flat = RgbImage::from_pixel(32, 32, Rgb([128, 128, 128]));
        let raster = decode_bytes(jpeg_bytes(&flat, 90)).unwrap();
        let levels = ElaDetector::error_levels(&raster.to_rgb(), 90).unwrap();
        assert!(levels.pixels().all(|p| p[0] <= 2));
    }

    #[test]
    fn uncompressed_noise_triggers_at_low_quality() {
        let raster = noise_raster(64);
        let tags = MetadataTags::absent();
        let thresholds = ThresholdConfig {
            ela_quality: 10,
            ..ThresholdConfig::default()
        };

        let finding = ElaDetector
            .detect(&DetectionInput::new(&raster, &tags), &thresholds)
            .unwrap();

        assert!(finding.triggered);
        assert!(finding.score > 0.3 && finding.score <= 1.0);
        assert!(!finding.regions.is_empty());
        assert!(finding.regions.iter().all(|r| r.area >= 100));
    }

    #[test]
    fn region_cutoff_is_inclusive() {
        let (width, height) = (40, 20);
        // 9x11 = 99 pixels on the left, 10x10 = 100 pixels on the right
        let mask: Vec<bool> = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                (x < 9 && y < 11) || ((20..30).contains(&x) && y < 10)
            })
            .collect();

        let regions = ElaDetector::significant_regions(&mask, width, height, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 100);
        assert_eq!((regions[0].x, regions[0].width), (20, 10));

        let regions = ElaDetector::significant_regions(&mask, width, height, 99);
        assert_eq!(regions.iter().map(|r| r.area).collect::<Vec<_>>(), vec![100, 99]);
    }

    #[test]
    fn unreadable_source_is_an_error() {
        let raster = noise_raster(16).with_source(b"definitely not an image".to_vec());
        let tags = MetadataTags::absent();

        let result = ElaDetector.detect(
            &DetectionInput::new(&raster, &tags),
            &ThresholdConfig::default(),
        );

        assert!(matches!(
            result,
            Err(DetectorError::Unreadable {
                technique: Technique::ErrorLevel,
                ..
            })
        ));
    }
}
