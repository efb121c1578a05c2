//! Single-image orchestration.

use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::aggregator::ConfidenceAggregator;
use crate::core::config::{AnalysisConfig, ThresholdConfig};
use crate::core::detectors::{battery, DetectionInput, Detector};
use crate::core::findings::{AnalysisReport, Finding, Technique};
use crate::core::metadata::{extract_tags, MetadataAnomalyScorer, MetadataTags};
use crate::core::raster::{decode_bytes, decode_file, RasterImage};
use crate::error::{ConfigError, Result};
use crate::events::{null_sender, AnalysisEvent, Event, EventSender};

/// Builder for an [`Analyzer`]
#[derive(Debug, Clone, Default)]
pub struct AnalyzerBuilder {
    thresholds: ThresholdConfig,
    config: AnalysisConfig,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the threshold snapshot
    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the per-technique enable flags
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn a single technique off
    pub fn disable(mut self, technique: Technique) -> Self {
        self.config = self.config.with(technique, false);
        self
    }

    /// Validate the thresholds and assemble the detector battery
    pub fn build(self) -> std::result::Result<Analyzer, ConfigError> {
        let thresholds = self.thresholds.validate()?;
        Ok(Analyzer {
            detectors: battery(&self.config),
            thresholds,
            config: self.config,
            scorer: MetadataAnomalyScorer::new(),
            aggregator: ConfidenceAggregator::new(),
        })
    }
}

/// Runs the enabled detectors over one image and folds their findings
/// into an [`AnalysisReport`].
///
/// Configuration is fixed at construction, so one analyzer can serve any
/// number of concurrent calls.
pub struct Analyzer {
    detectors: Vec<Box<dyn Detector>>,
    thresholds: ThresholdConfig,
    config: AnalysisConfig,
    scorer: MetadataAnomalyScorer,
    aggregator: ConfidenceAggregator,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze an already decoded raster
    pub fn analyze(&self, image: &RasterImage, tags: &MetadataTags) -> AnalysisReport {
        self.analyze_with_events(image, tags, &null_sender())
    }

    /// Analyze a raster, reporting each detector outcome
    pub fn analyze_with_events(
        &self,
        image: &RasterImage,
        tags: &MetadataTags,
        events: &EventSender,
    ) -> AnalysisReport {
        let techniques_used = self.config.enabled_techniques();
        events.send(Event::Analysis(AnalysisEvent::Started {
            total_techniques: techniques_used.len(),
        }));

        let input = DetectionInput::new(image, tags);
        // Ordered collect keeps findings in battery order
        let findings: Vec<Finding> = self
            .detectors
            .par_iter()
            .map(|detector| self.run_detector(detector.as_ref(), &input, events))
            .collect();

        let metadata_issues = if self.config.is_enabled(Technique::Metadata) {
            self.scorer.score(tags)
        } else {
            Vec::new()
        };

        let report =
            self.aggregator
                .aggregate(findings, metadata_issues, techniques_used, &self.thresholds);

        info!(
            width = image.width(),
            height = image.height(),
            confidence = report.confidence_score,
            tampering_detected = report.tampering_detected,
            "analysis complete"
        );
        events.send(Event::Analysis(AnalysisEvent::Completed {
            tampering_detected: report.tampering_detected,
            confidence_score: report.confidence_score,
        }));
        report
    }

    /// Decode an encoded image held in memory, then analyze it
    pub fn analyze_bytes(&self, bytes: Vec<u8>) -> Result<AnalysisReport> {
        let tags = extract_tags(&bytes);
        let image = decode_bytes(bytes)?;
        Ok(self.analyze(&image, &tags))
    }

    /// Read, decode and analyze an image file
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport> {
        let image = decode_file(path)?;
        let tags = image.source().map(extract_tags).unwrap_or_default();
        debug!(path = %path.display(), tags = tags.tag_count(), "image loaded");
        Ok(self.analyze(&image, &tags))
    }

    fn run_detector(
        &self,
        detector: &dyn Detector,
        input: &DetectionInput<'_>,
        events: &EventSender,
    ) -> Finding {
        let technique = detector.technique();
        match detector.detect(input, &self.thresholds) {
            Ok(finding) => {
                debug!(
                    %technique,
                    triggered = finding.triggered,
                    score = finding.score,
                    "detector finished"
                );
                events.send(Event::Analysis(AnalysisEvent::DetectorFinished {
                    technique,
                    triggered: finding.triggered,
                    score: finding.score,
                }));
                finding
            }
            Err(error) => {
                warn!(%technique, %error, "detector failed");
                events.send(Event::Analysis(AnalysisEvent::DetectorFailed {
                    technique,
                    message: error.to_string(),
                }));
                Finding::failed(technique, format!("Analysis skipped: {}", error))
            }
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        let thresholds = ThresholdConfig::default();
        let config = AnalysisConfig::default();
        Self {
            detectors: battery(&config),
            thresholds,
            config,
            scorer: MetadataAnomalyScorer::new(),
            aggregator: ConfidenceAggregator::new(),
        }
    }
}
