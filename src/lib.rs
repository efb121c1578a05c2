//! # Image Tamper Detector
//!
//! A battery of forensic detectors that explains why an image looks
//! manipulated, instead of just saying that it does.
//!
//! ## Core Philosophy
//! - **Show WHY** - every technique reports a finding with a description
//! - **Degrade, don't crash** - a detector that cannot run becomes an
//!   informational finding; only an unloadable image is an error
//! - **Deterministic** - the same bytes and configuration always produce
//!   the same report
//!
//! ## Architecture
//! - `core` - The detection engine (detectors, aggregator, pipeline)
//! - `events` - Event-driven progress reporting
//! - `error` - Typed errors per layer
//!
//! ## Example
//! ```rust,ignore
//! use image_tamper_detector::core::Analyzer;
//!
//! let report = Analyzer::default().analyze_file(Path::new("upload.jpg"))?;
//! if report.tampering_detected {
//!     for finding in report.triggered_findings() {
//!         println!("{}: {}", finding.technique, finding.description);
//!     }
//! }
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, TamperError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. The filter is
/// read from `RUST_LOG`.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    // A second call (tests, embedding apps) keeps the first subscriber
    let _ = tracing::subscriber::set_global_default(subscriber);
}
