//! # Error Module
//!
//! Error types for the tamper detector.
//!
//! ## Design Principles
//! - **Only load failures are fatal** - a detector that cannot run degrades
//!   to an informational finding instead of aborting the analysis
//! - **Include context** - paths, technique names, what went wrong
//! - **Typed per layer** - loading, configuration, scanning and detectors
//!   each have their own enum

use std::path::PathBuf;
use thiserror::Error;

use crate::core::findings::Technique;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TamperError {
    #[error("Image load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Analysis was cancelled")]
    Cancelled,
}

/// The raster could not be constructed from the caller's source.
///
/// This is the only failure that aborts an analysis.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Threshold or enable-flag configuration was rejected at construction
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed threshold configuration: {0}")]
    Malformed(String),

    #[error("Threshold {key} = {value} is out of range ({expected})")]
    OutOfRange {
        key: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single detector could not complete.
///
/// The orchestrator turns these into non-triggered `info` findings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("{technique} could not read the image: {reason}")]
    Unreadable { technique: Technique, reason: String },

    #[error("{technique} failed to re-encode the image: {reason}")]
    Encode { technique: Technique, reason: String },

    #[error("{technique} needs at least {required}x{required} pixels, image is {width}x{height}")]
    TooSmall {
        technique: Technique,
        required: u32,
        width: u32,
        height: u32,
    },

    #[error("{technique} found degenerate input: {reason}")]
    DegenerateInput { technique: Technique, reason: String },
}

impl DetectorError {
    /// Technique that raised the error
    pub fn technique(&self) -> Technique {
        match self {
            DetectorError::Unreadable { technique, .. }
            | DetectorError::Encode { technique, .. }
            | DetectorError::TooSmall { technique, .. }
            | DetectorError::DegenerateInput { technique, .. } => *technique,
        }
    }
}

/// Errors that occur while discovering images for a batch run
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {reason}")]
    ReadDirectory { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TamperError>;
