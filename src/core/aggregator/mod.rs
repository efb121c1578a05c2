//! # Aggregator Module
//!
//! Folds detector findings and metadata anomalies into one report.
//!
//! ## Scoring
//! 1. Take the score of every triggered finding with a non-zero score
//! 2. Add a metadata contribution of `min(1, anomalies * 0.3)` when any
//!    anomaly was flagged
//! 3. Average the collected scores (empty set = 0)
//! 4. With three or more contributors, multiply by 1.2 (corroboration
//!    bonus), capped at 1
//!
//! The verdict is always `confidence_score > forgery_confidence`.

use tracing::debug;

use crate::core::config::ThresholdConfig;
use crate::core::findings::{clamp_score, AnalysisReport, Finding, MetadataAnomaly, Technique};
use crate::core::signal::mean;

/// Per-anomaly metadata weight
const ANOMALY_WEIGHT: f64 = 0.3;
/// Contributors needed for the corroboration bonus
const CORROBORATION_MIN: usize = 3;
const CORROBORATION_FACTOR: f64 = 1.2;

/// Combines heterogeneous detector outputs into a confidence score
#[derive(Debug, Clone, Default)]
pub struct ConfidenceAggregator;

impl ConfidenceAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Scores that count toward confidence
    pub fn contributions(findings: &[Finding], anomalies: &[MetadataAnomaly]) -> Vec<f64> {
        let mut scores: Vec<f64> = findings
            .iter()
            .filter(|f| f.triggered && f.score > 0.0)
            .map(|f| clamp_score(f.score))
            .collect();
        if !anomalies.is_empty() {
            scores.push(clamp_score(anomalies.len() as f64 * ANOMALY_WEIGHT));
        }
        scores
    }

    /// Confidence in `[0, 1]` from a contribution set
    pub fn confidence(scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        let average = mean(scores);
        if scores.len() >= CORROBORATION_MIN {
            clamp_score(average * CORROBORATION_FACTOR)
        } else {
            clamp_score(average)
        }
    }

    /// Build the final report
    pub fn aggregate(
        &self,
        findings: Vec<Finding>,
        metadata_issues: Vec<MetadataAnomaly>,
        techniques_used: Vec<Technique>,
        thresholds: &ThresholdConfig,
    ) -> AnalysisReport {
        let scores = Self::contributions(&findings, &metadata_issues);
        let confidence_score = Self::confidence(&scores);
        let tampering_detected = confidence_score > thresholds.forgery_confidence;

        debug!(
            contributors = scores.len(),
            confidence_score, tampering_detected, "aggregated"
        );

        AnalysisReport {
            tampering_detected,
            confidence_score,
            techniques_used,
            findings,
            metadata_issues,
        }
    }
}
