//! # Core Module
//!
//! The UI-agnostic tamper detection engine.
//!
//! ## Modules
//! - `raster` - Decoded pixel buffers and image loading
//! - `metadata` - EXIF tag maps and the metadata anomaly scorer
//! - `config` - Threshold and enable-flag snapshots
//! - `findings` - Finding, anomaly and report records
//! - `signal` - Numeric kernels shared by the detectors
//! - `detectors` - The seven pixel-level forensic techniques
//! - `aggregator` - Folds findings into a confidence score
//! - `pipeline` - Single-image orchestration and batch runs

pub mod aggregator;
pub mod config;
pub mod detectors;
pub mod findings;
pub mod metadata;
pub mod pipeline;
pub mod raster;
pub mod signal;

// Re-export commonly used types
pub use config::{AnalysisConfig, ThresholdConfig};
pub use findings::{AnalysisReport, Finding, MetadataAnomaly, Severity, Technique};
pub use metadata::MetadataTags;
pub use pipeline::{Analyzer, Pipeline};
pub use raster::RasterImage;
