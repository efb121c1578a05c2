//! Metadata anomaly scoring.
//!
//! Flags, one anomaly each:
//! 1. More than three of the expected tags missing
//! 2. Software tag naming a known editing tool
//! 3. Creation and modification timestamps present but different
//! 4. Stripped (no tags) or invalid (unparsable) metadata block

use chrono::NaiveDateTime;
use tracing::debug;

use super::{
    MetadataTags, TagBlockStatus, TAG_DATE_TIME, TAG_DATE_TIME_ORIGINAL, TAG_MAKE, TAG_MODEL,
    TAG_SOFTWARE,
};
use crate::core::findings::{AnomalyKind, MetadataAnomaly, Severity};

/// Tags a camera original normally carries
pub const EXPECTED_TAGS: [&str; 5] = [
    TAG_MAKE,
    TAG_MODEL,
    TAG_DATE_TIME,
    TAG_DATE_TIME_ORIGINAL,
    TAG_SOFTWARE,
];

/// Software-tag fragments of image editors
pub const EDITING_TOOLS: &[&str] = &[
    "photoshop",
    "gimp",
    "paint.net",
    "lightroom",
    "pixlr",
    "affinity",
    "corel",
];

/// EXIF timestamp layout ("YYYY:MM:DD HH:MM:SS")
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Turns a normalized tag map into anomaly records
#[derive(Debug, Clone)]
pub struct MetadataAnomalyScorer {
    max_missing: usize,
}

impl Default for MetadataAnomalyScorer {
    fn default() -> Self {
        Self { max_missing: 3 }
    }
}

impl MetadataAnomalyScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a tag map; the result order is fixed (missing, editing, dates, block)
    pub fn score(&self, tags: &MetadataTags) -> Vec<MetadataAnomaly> {
        let mut anomalies = Vec::new();

        let missing: Vec<&str> = EXPECTED_TAGS
            .iter()
            .copied()
            .filter(|name| !tags.contains(name))
            .collect();
        if missing.len() > self.max_missing {
            anomalies.push(MetadataAnomaly {
                kind: AnomalyKind::MissingTags,
                severity: Severity::Medium,
                description: format!(
                    "Missing {} expected EXIF tags: {}",
                    missing.len(),
                    missing.join(", ")
                ),
            });
        }

        if let Some(software) = tags.get(TAG_SOFTWARE) {
            if let Some(tool) = editing_tool(software) {
                anomalies.push(MetadataAnomaly {
                    kind: AnomalyKind::EditingSoftware,
                    severity: Severity::High,
                    description: format!("Image edited with: {} ({})", software, tool),
                });
            }
        }

        if let (Some(modified), Some(created)) =
            (tags.get(TAG_DATE_TIME), tags.get(TAG_DATE_TIME_ORIGINAL))
        {
            if !same_timestamp(modified, created) {
                anomalies.push(MetadataAnomaly {
                    kind: AnomalyKind::TimestampMismatch,
                    severity: Severity::Medium,
                    description: format!(
                        "DateTime ({}) and DateTimeOriginal ({}) do not match",
                        modified, created
                    ),
                });
            }
        }

        match tags.status() {
            TagBlockStatus::Unparsable { reason } => anomalies.push(MetadataAnomaly {
                kind: AnomalyKind::InvalidMetadata,
                severity: Severity::High,
                description: format!("EXIF data is corrupted or invalid: {}", reason),
            }),
            _ if tags.is_stripped() => anomalies.push(MetadataAnomaly {
                kind: AnomalyKind::StrippedMetadata,
                severity: Severity::High,
                description: "EXIF data appears to be stripped or missing".to_string(),
            }),
            _ => {}
        }

        debug!(anomalies = anomalies.len(), "metadata scored");
        anomalies
    }
}

/// Editing tool named by a software tag, if any
pub fn editing_tool(software: &str) -> Option<&'static str> {
    let lower = software.to_lowercase();
    EDITING_TOOLS.iter().copied().find(|tool| lower.contains(tool))
}

fn same_timestamp(a: &str, b: &str) -> bool {
    let parse = |s: &str| NaiveDateTime::parse_from_str(s.trim(), EXIF_DATE_FORMAT).ok();
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::TagGroup;

    fn camera_tags() -> MetadataTags {
        MetadataTags::parsed()
            .with_tag(TagGroup::Image, TAG_MAKE, "Canon")
            .with_tag(TagGroup::Image, TAG_MODEL, "EOS R5")
            .with_tag(TagGroup::Image, TAG_DATE_TIME, "2024:05:01 10:00:00")
            .with_tag(TagGroup::Exif, TAG_DATE_TIME_ORIGINAL, "2024:05:01 10:00:00")
            .with_tag(TagGroup::Image, TAG_SOFTWARE, "Firmware Version 1.8.1")
    }

    fn kinds(anomalies: &[MetadataAnomaly]) -> Vec<AnomalyKind> {
        anomalies.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn camera_original_has_no_anomalies() {
        let anomalies = MetadataAnomalyScorer::new().score(&camera_tags());
        assert!(anomalies.is_empty(), "unexpected: {anomalies:?}");
    }

    #[test]
    fn stripped_block_flags_missing_and_stripped() {
        let anomalies = MetadataAnomalyScorer::new().score(&MetadataTags::absent());
        assert_eq!(
            kinds(&anomalies),
            vec![AnomalyKind::MissingTags, AnomalyKind::StrippedMetadata]
        );
    }

    #[test]
    fn three_missing_tags_are_tolerated() {
        let tags = MetadataTags::parsed()
            .with_tag(TagGroup::Image, TAG_MAKE, "Nikon")
            .with_tag(TagGroup::Image, TAG_MODEL, "Z6");
        let anomalies = MetadataAnomalyScorer::new().score(&tags);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn four_missing_tags_are_flagged() {
        let tags = MetadataTags::parsed().with_tag(TagGroup::Image, TAG_MAKE, "Nikon");
        let anomalies = MetadataAnomalyScorer::new().score(&tags);
        assert_eq!(kinds(&anomalies), vec![AnomalyKind::MissingTags]);
        assert_eq!(anomalies[0].severity, Severity::Medium);
    }

    #[test]
    fn editing_software_is_flagged() {
        let tags = camera_tags().with_tag(TagGroup::Image, TAG_SOFTWARE, "Adobe Photoshop 25.0");
        let anomalies = MetadataAnomalyScorer::new().score(&tags);
        assert_eq!(kinds(&anomalies), vec![AnomalyKind::EditingSoftware]);
        assert_eq!(anomalies[0].severity, Severity::High);
        assert!(anomalies[0].description.contains("Photoshop"));
    }

    #[test]
    fn differing_timestamps_are_flagged() {
        let tags = camera_tags().with_tag(TagGroup::Image, TAG_DATE_TIME, "2024:06:12 08:30:00");
        let anomalies = MetadataAnomalyScorer::new().score(&tags);
        assert_eq!(kinds(&anomalies), vec![AnomalyKind::TimestampMismatch]);
    }

    #[test]
    fn padded_timestamps_compare_equal() {
        assert!(same_timestamp("2024:05:01 10:00:00 ", "2024:05:01 10:00:00"));
        assert!(!same_timestamp("garbage", "2024:05:01 10:00:00"));
    }

    #[test]
    fn unparsable_block_is_invalid() {
        let anomalies = MetadataAnomalyScorer::new().score(&MetadataTags::unparsable("bad offset"));
        assert_eq!(
            kinds(&anomalies),
            vec![AnomalyKind::MissingTags, AnomalyKind::InvalidMetadata]
        );
    }

    #[test]
    fn editing_tool_match_is_case_insensitive() {
        assert_eq!(editing_tool("GIMP 2.10"), Some("gimp"));
        assert_eq!(editing_tool("Ver.1.00"), None);
    }
}
