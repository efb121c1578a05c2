//! Batch execution over files and directories.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::analyzer::Analyzer;
use super::discovery::{discover, DiscoveryConfig};
use crate::core::findings::AnalysisReport;
use crate::error::TamperError;
use crate::events::{
    null_sender, BatchEvent, BatchProgress, Event, EventSender, PipelineEvent, PipelinePhase,
    PipelineSummary,
};

/// Coarse cancellation shared between a caller and a running pipeline.
///
/// Checked before each image; an image already being analyzed runs to
/// completion and its result is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Report for one analyzed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// Result of pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// One report per image that decoded, in discovery order
    pub reports: Vec<ImageReport>,
    /// Total images discovered
    pub total_images: usize,
    /// Non-fatal errors (unreadable entries, undecodable files)
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Reports whose verdict is tampered
    pub fn flagged(&self) -> impl Iterator<Item = &ImageReport> {
        self.reports.iter().filter(|r| r.report.tampering_detected)
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Files and directories to analyze
    pub paths: Vec<PathBuf>,
    /// Directory walk settings
    pub discovery: DiscoveryConfig,
}

/// Builder for pipeline configuration
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    analyzer: Option<Analyzer>,
    cancellation: Option<CancellationToken>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Files or directories to analyze
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Use a configured analyzer instead of the defaults
    pub fn analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.discovery.include_hidden = include;
        self
    }

    /// Follow symbolic links while walking
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.discovery.follow_symlinks = follow;
        self
    }

    /// Limit directory depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.discovery.max_depth = Some(depth);
        self
    }

    /// Share a cancellation token with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            analyzer: self.analyzer.unwrap_or_default(),
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

/// The batch analysis pipeline
pub struct Pipeline {
    config: PipelineConfig,
    analyzer: Analyzer,
    cancellation: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Token that cancels this pipeline
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, TamperError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, TamperError> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));
        if self.cancellation.is_cancelled() {
            return Err(self.cancelled(events));
        }

        // Phase 1: Discovering
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Discovering,
        }));

        let discovery = discover(&self.config.paths, &self.config.discovery).map_err(|e| {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
            e
        })?;
        let mut errors: Vec<String> = discovery.errors.iter().map(ToString::to_string).collect();
        let images = discovery.images;
        let total_images = images.len();

        events.send(Event::Batch(BatchEvent::Discovered { total_images }));

        // Phase 2: Analyzing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Analyzing,
        }));

        let completed = AtomicUsize::new(0);
        let outcomes: Vec<Option<Result<ImageReport, String>>> = images
            .par_iter()
            .map(|path| {
                if self.cancellation.is_cancelled() {
                    return None;
                }
                let outcome = self.analyze_one(path, events);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                events.send(Event::Batch(BatchEvent::Progress(BatchProgress {
                    completed: done,
                    total: total_images,
                    current_path: path.clone(),
                })));
                Some(outcome)
            })
            .collect();

        if self.cancellation.is_cancelled() {
            return Err(self.cancelled(events));
        }

        let mut reports = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(report) => reports.push(report),
                Err(message) => errors.push(message),
            }
        }

        let flagged = reports
            .iter()
            .filter(|r| r.report.tampering_detected)
            .count();
        let duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Batch(BatchEvent::Completed {
            analyzed: reports.len(),
            flagged,
        }));
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images,
                analyzed: reports.len(),
                flagged,
                errors: errors.len(),
                duration_ms,
            },
        }));
        info!(total_images, flagged, duration_ms, "batch complete");

        Ok(PipelineResult {
            reports,
            total_images,
            errors,
            duration_ms,
        })
    }

    fn analyze_one(&self, path: &Path, events: &EventSender) -> Result<ImageReport, String> {
        match self.analyzer.analyze_file(path) {
            Ok(report) => {
                events.send(Event::Batch(BatchEvent::ImageAnalyzed {
                    path: path.to_path_buf(),
                    tampering_detected: report.tampering_detected,
                    confidence_score: report.confidence_score,
                }));
                Ok(ImageReport {
                    path: path.to_path_buf(),
                    report,
                })
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "image skipped");
                let message = e.to_string();
                events.send(Event::Batch(BatchEvent::Error {
                    path: path.to_path_buf(),
                    message: message.clone(),
                }));
                Err(message)
            }
        }
    }

    fn cancelled(&self, events: &EventSender) -> TamperError {
        info!("batch cancelled");
        events.send(Event::Pipeline(PipelineEvent::Cancelled));
        TamperError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn pipeline_builder_sets_discovery_options() {
        let pipeline = Pipeline::builder()
            .paths(vec![PathBuf::from("/uploads")])
            .include_hidden(true)
            .max_depth(2)
            .build();

        assert!(pipeline.config.discovery.include_hidden);
        assert_eq!(pipeline.config.discovery.max_depth, Some(2));
        assert_eq!(pipeline.config.paths, vec![PathBuf::from("/uploads")]);
    }

    #[test]
    fn pipeline_handles_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let pipeline = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .build();

        let result = pipeline.run().unwrap();

        assert_eq!(result.total_images, 0);
        assert!(result.reports.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn corrupt_file_is_a_non_fatal_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let result = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .build()
            .run()
            .unwrap();

        assert_eq!(result.total_images, 1);
        assert!(result.reports.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("broken.jpg"));
    }

    #[test]
    fn cancelled_pipeline_returns_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .cancellation(token.clone())
            .build();

        token.cancel();
        let (sender, receiver) = EventChannel::new();
        let result = pipeline.run_with_events(&sender);
        drop(sender);

        assert!(matches!(result, Err(TamperError::Cancelled)));
        assert!(receiver
            .iter()
            .any(|e| matches!(e, Event::Pipeline(PipelineEvent::Cancelled))));
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder().cancellation(token.clone()).build();

        assert!(!pipeline.cancellation_token().is_cancelled());
        token.cancel();
        assert!(pipeline.cancellation_token().is_cancelled());
    }

    #[test]
    fn missing_path_fails_discovery() {
        let result = Pipeline::builder()
            .paths(vec![PathBuf::from("/definitely/not/here")])
            .build()
            .run();
        assert!(matches!(result, Err(TamperError::Scan(_))));
    }
}
