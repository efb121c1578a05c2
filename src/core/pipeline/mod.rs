//! # Pipeline Module
//!
//! Orchestrates analysis of one image and of whole directories.
//!
//! ## Single image
//! [`Analyzer`] runs every enabled detector, turns detector failures into
//! informational findings, scores the metadata and hands everything to the
//! aggregator. Only a failure to load the image is returned as an error.
//!
//! ## Batch
//! [`Pipeline`] discovers images, analyzes them and reports progress
//! through events. A file that cannot be decoded is recorded and skipped.
//!
//! ## Parallelism
//! Uses rayon both across detectors for one image and across images in a
//! batch. Results are collected in input order, so reports are
//! deterministic.

mod analyzer;
mod discovery;
mod executor;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use discovery::{discover, Discovery, DiscoveryConfig, ImageFilter};
pub use executor::{
    CancellationToken, ImageReport, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult,
};
