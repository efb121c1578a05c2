//! # Findings Module
//!
//! Typed result records shared by every detector, the metadata scorer and
//! the aggregator. Each record is built once and never edited afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clamp a score into `[0, 1]`, mapping NaN to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Forensic techniques known to the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Error-level analysis against a fresh lossy re-encoding
    ErrorLevel,
    /// Metadata anomaly scoring
    Metadata,
    /// Duplicated-region detection with local keypoint descriptors
    CopyMove,
    /// Block-wise noise residual consistency
    NoisePattern,
    /// Periodic peaks in the transform-coefficient histogram
    DoubleCompression,
    /// Lighting consistency across blocks
    Splicing,
    /// Heuristics for synthetic (generated) imagery
    AiGenerated,
    /// Log-magnitude spectrum statistics
    FrequencyDomain,
}

impl Technique {
    /// Every technique in the order the analyzer runs them
    pub const ALL: [Technique; 8] = [
        Technique::ErrorLevel,
        Technique::Metadata,
        Technique::CopyMove,
        Technique::NoisePattern,
        Technique::DoubleCompression,
        Technique::Splicing,
        Technique::AiGenerated,
        Technique::FrequencyDomain,
    ];

    /// Stable machine identifier (used in configs and on the command line)
    pub fn id(&self) -> &'static str {
        match self {
            Technique::ErrorLevel => "error_level",
            Technique::Metadata => "metadata",
            Technique::CopyMove => "copy_move",
            Technique::NoisePattern => "noise_pattern",
            Technique::DoubleCompression => "double_compression",
            Technique::Splicing => "splicing",
            Technique::AiGenerated => "ai_generated",
            Technique::FrequencyDomain => "frequency_domain",
        }
    }

    /// Parse a technique from its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Whether this technique produces a `Finding` (metadata feeds anomalies instead)
    pub fn is_detector(&self) -> bool {
        !matches!(self, Technique::Metadata)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Technique::ErrorLevel => "Error Level Analysis",
            Technique::Metadata => "Metadata Analysis",
            Technique::CopyMove => "Copy-Move Detection",
            Technique::NoisePattern => "Noise Pattern Analysis",
            Technique::DoubleCompression => "Double Compression Detection",
            Technique::Splicing => "Splicing Detection",
            Technique::AiGenerated => "AI-Generated Image Detection",
            Technique::FrequencyDomain => "Frequency Domain Analysis",
        };
        write!(f, "{}", name)
    }
}

/// How serious a finding or anomaly is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    /// The technique could not run; carries no evidence either way
    Info,
}

impl Severity {
    /// Default banding for a triggered finding's score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Severity::High
        } else if score >= 0.4 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Info => "info",
        };
        write!(f, "{}", name)
    }
}

/// Axis-aligned bounding box of a suspicious region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of pixels belonging to the region (not the box area)
    pub area: u32,
}

/// Outcome of one detector invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub technique: Technique,
    pub triggered: bool,
    /// Always within `[0, 1]`
    pub score: f64,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
}

impl Finding {
    /// A triggered finding, severity banded from the score
    pub fn triggered(technique: Technique, score: f64, description: impl Into<String>) -> Self {
        let score = clamp_score(score);
        Self {
            technique,
            triggered: true,
            score,
            severity: Severity::from_score(score),
            description: description.into(),
            regions: Vec::new(),
        }
    }

    /// A finding that ran to completion without triggering
    pub fn clear(technique: Technique, description: impl Into<String>) -> Self {
        Self {
            technique,
            triggered: false,
            score: 0.0,
            severity: Severity::Low,
            description: description.into(),
            regions: Vec::new(),
        }
    }

    /// Substitute for a detector that could not complete
    pub fn failed(technique: Technique, description: impl Into<String>) -> Self {
        Self {
            technique,
            triggered: false,
            score: 0.0,
            severity: Severity::Info,
            description: description.into(),
            regions: Vec::new(),
        }
    }

    /// Override the banded severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach suspicious regions
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }
}

/// Category of a metadata anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    MissingTags,
    EditingSoftware,
    TimestampMismatch,
    StrippedMetadata,
    InvalidMetadata,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyKind::MissingTags => "Missing Metadata",
            AnomalyKind::EditingSoftware => "Editing Software Detected",
            AnomalyKind::TimestampMismatch => "Date Inconsistency",
            AnomalyKind::StrippedMetadata => "Stripped Metadata",
            AnomalyKind::InvalidMetadata => "Invalid Metadata",
        };
        write!(f, "{}", name)
    }
}

/// One flagged metadata condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAnomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
}

/// Final result of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Derived from `confidence_score > forgery_confidence`
    pub tampering_detected: bool,
    /// Always within `[0, 1]`
    pub confidence_score: f64,
    /// Techniques actually run, in execution order
    pub techniques_used: Vec<Technique>,
    pub findings: Vec<Finding>,
    pub metadata_issues: Vec<MetadataAnomaly>,
}

impl AnalysisReport {
    /// Findings that triggered
    pub fn triggered_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.triggered)
    }

    /// Finding produced by a given technique, if it ran
    pub fn finding(&self, technique: Technique) -> Option<&Finding> {
        self.findings.iter().find(|f| f.technique == technique)
    }
}
