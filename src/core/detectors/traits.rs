//! Trait definitions for forensic detectors.

use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Technique};
use crate::core::metadata::MetadataTags;
use crate::core::raster::RasterImage;
use crate::error::DetectorError;

/// Everything a detector may look at for one image
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub image: &'a RasterImage,
    pub tags: &'a MetadataTags,
}

impl<'a> DetectionInput<'a> {
    pub fn new(image: &'a RasterImage, tags: &'a MetadataTags) -> Self {
        Self { image, tags }
    }
}

/// A stateless forensic technique producing exactly one finding per image.
///
/// Implementations never panic on odd input: anything that stops the
/// computation is returned as a `DetectorError`, which the analyzer turns
/// into an informational finding.
pub trait Detector: Send + Sync {
    /// Technique this detector implements
    fn technique(&self) -> Technique;

    /// Examine one image under a threshold snapshot
    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError>;
}
