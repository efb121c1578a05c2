//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::findings::Technique;

/// All events emitted by the analyzer and the batch pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Single-image analysis events
    Analysis(AnalysisEvent),
    /// Batch progress across many images
    Batch(BatchEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while one image runs through the detector battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalysisEvent {
    /// Battery is about to run
    Started { total_techniques: usize },
    /// A detector returned a finding
    DetectorFinished {
        technique: Technique,
        triggered: bool,
        score: f64,
    },
    /// A detector could not complete and was replaced by an info finding
    DetectorFailed { technique: Technique, message: String },
    /// Report is ready
    Completed {
        tampering_detected: bool,
        confidence_score: f64,
    },
}

/// Events while a batch of files is analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// Discovery finished
    Discovered { total_images: usize },
    /// Progress update after each image
    Progress(BatchProgress),
    /// One image produced a report
    ImageAnalyzed {
        path: PathBuf,
        tampering_detected: bool,
        confidence_score: f64,
    },
    /// One image could not be loaded
    Error { path: PathBuf, message: String },
    /// All images processed
    Completed { analyzed: usize, flagged: usize },
}

/// Progress information during a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Number of images finished (analyzed or failed)
    pub completed: usize,
    /// Total number of images discovered
    pub total: usize,
    /// Image that just finished
    pub current_path: PathBuf,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Discovering,
    Analyzing,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images found during discovery
    pub total_images: usize,
    /// Images that produced a report
    pub analyzed: usize,
    /// Reports with `tampering_detected`
    pub flagged: usize,
    /// Images that failed to load
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Discovering => write!(f, "Discovering"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
        }
    }
}
