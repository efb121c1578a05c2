//! # Detectors Module
//!
//! The seven pixel-level forensic techniques.
//!
//! ## Techniques
//! - **Error level** - compares the image with a fresh JPEG re-encoding
//! - **Copy-move** - matches rotation-invariant keypoint descriptors against themselves
//! - **Noise pattern** - block-wise variance of a median-filter residual
//! - **Double compression** - periodic peaks in the DCT coefficient histogram
//! - **Splicing** - lighting variation across 32x32 blocks
//! - **AI-generated** - additive smoothness, texture, noise and metadata heuristics
//! - **Frequency domain** - statistics of the high-frequency log spectrum
//!
//! Each detector is a unit struct implementing [`Detector`]; none keeps
//! state between calls, so one battery can be shared across threads.
//!
//! ## Example
//! ```rust,ignore
//! use image_tamper_detector::core::detectors::{battery, DetectionInput};
//!
//! let input = DetectionInput::new(&raster, &tags);
//! for detector in battery(&AnalysisConfig::default()) {
//!     let finding = detector.detect(&input, &ThresholdConfig::default())?;
//! }
//! ```

mod ai_generated;
mod copy_move;
mod double_compression;
mod ela;
mod frequency;
mod noise;
mod splicing;
mod traits;

pub use ai_generated::{AiGeneratedDetector, AiIndicators};
pub use copy_move::{CopyMoveDetector, Keypoint};
pub use double_compression::DoubleCompressionDetector;
pub use ela::ElaDetector;
pub use frequency::{FrequencyDomainDetector, SpectrumShape};
pub use noise::NoisePatternDetector;
pub use splicing::SplicingDetector;
pub use traits::{DetectionInput, Detector};

use crate::core::config::AnalysisConfig;
use crate::core::findings::Technique;

/// Detector implementing a technique; `None` for metadata, which is scored separately
pub fn detector_for(technique: Technique) -> Option<Box<dyn Detector>> {
    let detector: Box<dyn Detector> = match technique {
        Technique::ErrorLevel => Box::new(ElaDetector),
        Technique::CopyMove => Box::new(CopyMoveDetector),
        Technique::NoisePattern => Box::new(NoisePatternDetector),
        Technique::DoubleCompression => Box::new(DoubleCompressionDetector),
        Technique::Splicing => Box::new(SplicingDetector),
        Technique::AiGenerated => Box::new(AiGeneratedDetector),
        Technique::FrequencyDomain => Box::new(FrequencyDomainDetector),
        Technique::Metadata => return None,
    };
    Some(detector)
}

/// Enabled detectors in canonical order
pub fn battery(config: &AnalysisConfig) -> Vec<Box<dyn Detector>> {
    config
        .enabled_techniques()
        .into_iter()
        .filter_map(detector_for)
        .collect()
}
