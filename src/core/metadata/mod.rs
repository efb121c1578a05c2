//! # Metadata Module
//!
//! Normalized EXIF tag map plus the anomaly scorer that consumes it.
//!
//! ## Tag Map
//! Tags are grouped the way the EXIF block stores them (primary image IFD,
//! Exif sub-IFD, GPS, interoperability, thumbnail) and addressed by their
//! standard EXIF names (`Make`, `Model`, `DateTime`, `DateTimeOriginal`,
//! `Software`, ...). The map also records whether a block was found at all
//! and whether it parsed.
//!
//! ## Extraction
//! `extract_tags` reads the block from an encoded JPEG, PNG, WebP, TIFF or
//! HEIF stream with `kamadak-exif`. Callers with their own extractor can
//! build a `MetadataTags` directly.

mod scorer;

pub use scorer::{MetadataAnomalyScorer, EDITING_TOOLS, EXPECTED_TAGS};

use exif::{Context, In, Reader, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;

use crate::core::raster::ImageFormat;

pub const TAG_MAKE: &str = "Make";
pub const TAG_MODEL: &str = "Model";
pub const TAG_DATE_TIME: &str = "DateTime";
pub const TAG_DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
pub const TAG_SOFTWARE: &str = "Software";

/// EXIF tag groups (IFDs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagGroup {
    Image,
    Exif,
    Gps,
    Interop,
    Thumbnail,
}

/// Whether the metadata block was present and readable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagBlockStatus {
    Parsed,
    /// No metadata block in the file
    Absent,
    /// A block exists but could not be decoded
    Unparsable { reason: String },
}

/// Normalized tag map handed to the scorer and the AI heuristics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTags {
    status: TagBlockStatus,
    groups: BTreeMap<TagGroup, BTreeMap<String, String>>,
}

impl Default for MetadataTags {
    fn default() -> Self {
        Self::absent()
    }
}

impl MetadataTags {
    /// No metadata block at all
    pub fn absent() -> Self {
        Self {
            status: TagBlockStatus::Absent,
            groups: BTreeMap::new(),
        }
    }

    /// A block that failed to decode
    pub fn unparsable(reason: impl Into<String>) -> Self {
        Self {
            status: TagBlockStatus::Unparsable {
                reason: reason.into(),
            },
            groups: BTreeMap::new(),
        }
    }

    /// A parsed block with no tags yet
    pub fn parsed() -> Self {
        Self {
            status: TagBlockStatus::Parsed,
            groups: BTreeMap::new(),
        }
    }

    /// Builder form of `insert`
    pub fn with_tag(mut self, group: TagGroup, name: &str, value: &str) -> Self {
        self.insert(group, name, value);
        self
    }

    /// Add a tag; inserting into an absent block marks it parsed
    pub fn insert(&mut self, group: TagGroup, name: &str, value: &str) {
        if self.status == TagBlockStatus::Absent {
            self.status = TagBlockStatus::Parsed;
        }
        self.groups
            .entry(group)
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    pub fn status(&self) -> &TagBlockStatus {
        &self.status
    }

    /// Value of a tag by EXIF name, searched across groups (thumbnail last)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.groups
            .values()
            .find_map(|tags| tags.get(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Total number of tags across groups
    pub fn tag_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// No block, or a parsed block whose groups are all empty
    pub fn is_stripped(&self) -> bool {
        match self.status {
            TagBlockStatus::Absent => true,
            TagBlockStatus::Parsed => self.tag_count() == 0,
            TagBlockStatus::Unparsable { .. } => false,
        }
    }

    /// Camera make and model both missing
    pub fn lacks_camera(&self) -> bool {
        !self.contains(TAG_MAKE) && !self.contains(TAG_MODEL)
    }
}

/// Extract the EXIF tag map from an encoded image stream
pub fn extract_tags(bytes: &[u8]) -> MetadataTags {
    let mut cursor = Cursor::new(bytes);
    let exif_reader = match Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(exif::Error::NotFound(_)) => return MetadataTags::absent(),
        // Containers kamadak-exif cannot read simply carry no block
        Err(_) if ImageFormat::sniff(bytes) == ImageFormat::Other => {
            return MetadataTags::absent()
        }
        Err(e) => return MetadataTags::unparsable(e.to_string()),
    };

    let mut tags = MetadataTags::parsed();
    for field in exif_reader.fields() {
        let group = if field.ifd_num == In::THUMBNAIL {
            TagGroup::Thumbnail
        } else {
            match field.tag.context() {
                Context::Tiff => TagGroup::Image,
                Context::Exif => TagGroup::Exif,
                Context::Gps => TagGroup::Gps,
                Context::Interop => TagGroup::Interop,
                _ => TagGroup::Image,
            }
        };

        let value = get_string_value(&field.value)
            .unwrap_or_else(|| field.display_value().to_string());
        tags.insert(group, &field.tag.to_string(), &value);
    }

    tags
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
