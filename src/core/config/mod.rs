//! # Config Module
//!
//! Immutable configuration snapshots for one analysis.
//!
//! - `ThresholdConfig` - numeric calibration knobs for every detector
//!   and the verdict threshold
//! - `AnalysisConfig` - which techniques run
//!
//! Both are resolved once at construction: absent keys take their
//! documented default, unknown keys or out-of-range values are rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::findings::Technique;
use crate::error::ConfigError;

/// Numeric thresholds for the detector battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Binary threshold on the equalized ELA map (lower = more sensitive)
    pub ela_threshold: u8,
    /// JPEG quality used for the ELA re-encode
    pub ela_quality: u8,
    /// Maximum raw error level must exceed this for ELA to trigger
    pub ela_min_difference: f64,
    /// Smallest connected region (pixels) kept by ELA
    pub ela_min_region_area: u32,
    /// Confidence above which tampering is reported
    pub forgery_confidence: f64,
    /// Nearest / second-nearest distance ratio for copy-move matches
    pub copy_move_ratio: f64,
    /// Minimum separation (pixels) between matched keypoints
    pub copy_move_min_distance: f64,
    /// Match count that must be exceeded to trigger copy-move
    pub copy_move_min_matches: usize,
    /// Fewer keypoints than this means "insufficient features"
    pub copy_move_min_keypoints: usize,
    /// Block-variance stdev / mean ratio that flags uneven noise
    pub noise_inconsistency: f64,
    /// Histogram peak count that must be exceeded for double compression
    pub double_compression_min_peaks: usize,
    /// Peak spacing stdev below which spacing counts as periodic
    pub double_compression_max_spacing_stdev: f64,
    /// Coefficient of variation of block lightness that flags splicing
    pub splicing_variation: f64,
    /// Accumulated heuristic score above which an image is called synthetic
    pub ai_generated_threshold: f64,
    /// Laplacian variance below which textures count as unnaturally smooth
    pub ai_smoothness_variance: f64,
    /// Texture-pattern uniformity above which micro-texture counts as repetitive
    pub ai_texture_uniformity: f64,
    /// Blur-residual stdev below which sensor noise counts as missing
    pub ai_noise_floor: f64,
    /// Spectrum stdev below this fraction of the mean is over-uniform
    pub frequency_uniform_ratio: f64,
    /// Spectrum stdev above this multiple of the mean is over-irregular
    pub frequency_irregular_ratio: f64,
    /// Optional cap on the longest side the transform-based detectors see;
    /// 0 analyzes the full-resolution luma
    pub spectral_max_side: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ela_threshold: 25,
            ela_quality: 90,
            ela_min_difference: 30.0,
            ela_min_region_area: 100,
            forgery_confidence: 0.35,
            copy_move_ratio: 0.7,
            copy_move_min_distance: 50.0,
            copy_move_min_matches: 20,
            copy_move_min_keypoints: 10,
            noise_inconsistency: 0.5,
            double_compression_min_peaks: 5,
            double_compression_max_spacing_stdev: 5.0,
            splicing_variation: 0.3,
            ai_generated_threshold: 0.5,
            ai_smoothness_variance: 50.0,
            ai_texture_uniformity: 0.15,
            ai_noise_floor: 5.0,
            frequency_uniform_ratio: 0.3,
            frequency_irregular_ratio: 1.5,
            spectral_max_side: 0,
        }
    }
}

impl ThresholdConfig {
    /// Build from a JSON object; absent keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()
    }

    /// Build from an already-parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()
    }

    /// Build from a flat key/number map, as handed over by a settings loader
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        let object = map
            .iter()
            .map(|(key, value)| (key.clone(), number_value(*value)))
            .collect::<serde_json::Map<_, _>>();
        Self::from_value(serde_json::Value::Object(object))
    }

    /// Read a JSON threshold file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Check every knob's range, returning the config if it is usable
    pub fn validate(self) -> Result<Self, ConfigError> {
        check_range("ela_quality", self.ela_quality as f64, 1.0, 100.0, "1..=100")?;
        check_range("ela_min_difference", self.ela_min_difference, 0.0, 255.0, "0..=255")?;
        check_range(
            "ela_min_region_area",
            self.ela_min_region_area as f64,
            1.0,
            f64::MAX,
            ">= 1",
        )?;
        check_range("forgery_confidence", self.forgery_confidence, 0.0, 1.0, "0..=1")?;
        check_range("copy_move_ratio", self.copy_move_ratio, f64::MIN_POSITIVE, 1.0, "0 < r <= 1")?;
        check_range("copy_move_min_distance", self.copy_move_min_distance, 0.0, f64::MAX, ">= 0")?;
        check_range(
            "copy_move_min_keypoints",
            self.copy_move_min_keypoints as f64,
            3.0,
            f64::MAX,
            ">= 3",
        )?;
        check_range("noise_inconsistency", self.noise_inconsistency, 0.0, f64::MAX, ">= 0")?;
        check_range(
            "double_compression_max_spacing_stdev",
            self.double_compression_max_spacing_stdev,
            0.0,
            f64::MAX,
            ">= 0",
        )?;
        check_range("splicing_variation", self.splicing_variation, 0.0, f64::MAX, ">= 0")?;
        check_range("ai_generated_threshold", self.ai_generated_threshold, 0.0, 1.0, "0..=1")?;
        check_range("ai_smoothness_variance", self.ai_smoothness_variance, 0.0, f64::MAX, ">= 0")?;
        check_range("ai_texture_uniformity", self.ai_texture_uniformity, 0.0, 1.0, "0..=1")?;
        check_range("ai_noise_floor", self.ai_noise_floor, 0.0, f64::MAX, ">= 0")?;
        check_range("frequency_uniform_ratio", self.frequency_uniform_ratio, 0.0, f64::MAX, ">= 0")?;
        check_range(
            "frequency_irregular_ratio",
            self.frequency_irregular_ratio,
            self.frequency_uniform_ratio,
            f64::MAX,
            ">= frequency_uniform_ratio",
        )?;
        if self.spectral_max_side != 0 {
            check_range(
                "spectral_max_side",
                self.spectral_max_side as f64,
                8.0,
                f64::MAX,
                "0 or >= 8",
            )?;
        }
        Ok(self)
    }

    /// Downscale bound for the transform-based detectors, if one was set
    pub fn spectral_cap(&self) -> Option<u32> {
        (self.spectral_max_side != 0).then_some(self.spectral_max_side)
    }
}

fn number_value(value: f64) -> serde_json::Value {
    // Integral values go in as integers so usize/u8 knobs deserialize
    if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
        serde_json::Value::from(value as u64)
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn check_range(
    key: &'static str,
    value: f64,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            expected,
        })
    }
}

/// Per-technique enable flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub error_level: bool,
    pub metadata: bool,
    pub copy_move: bool,
    pub noise_pattern: bool,
    pub double_compression: bool,
    pub splicing: bool,
    pub ai_generated: bool,
    pub frequency_domain: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            error_level: true,
            metadata: true,
            copy_move: true,
            noise_pattern: true,
            double_compression: true,
            splicing: true,
            ai_generated: true,
            frequency_domain: true,
        }
    }
}

impl AnalysisConfig {
    /// Every technique switched off
    pub fn none() -> Self {
        Self {
            error_level: false,
            metadata: false,
            copy_move: false,
            noise_pattern: false,
            double_compression: false,
            splicing: false,
            ai_generated: false,
            frequency_domain: false,
        }
    }

    /// Whether a technique should run
    pub fn is_enabled(&self, technique: Technique) -> bool {
        match technique {
            Technique::ErrorLevel => self.error_level,
            Technique::Metadata => self.metadata,
            Technique::CopyMove => self.copy_move,
            Technique::NoisePattern => self.noise_pattern,
            Technique::DoubleCompression => self.double_compression,
            Technique::Splicing => self.splicing,
            Technique::AiGenerated => self.ai_generated,
            Technique::FrequencyDomain => self.frequency_domain,
        }
    }

    /// Return a copy with one technique switched on or off
    pub fn with(mut self, technique: Technique, enabled: bool) -> Self {
        let flag = match technique {
            Technique::ErrorLevel => &mut self.error_level,
            Technique::Metadata => &mut self.metadata,
            Technique::CopyMove => &mut self.copy_move,
            Technique::NoisePattern => &mut self.noise_pattern,
            Technique::DoubleCompression => &mut self.double_compression,
            Technique::Splicing => &mut self.splicing,
            Technique::AiGenerated => &mut self.ai_generated,
            Technique::FrequencyDomain => &mut self.frequency_domain,
        };
        *flag = enabled;
        self
    }

    /// Switch off techniques named by identifier
    pub fn disable_ids<I, S>(self, ids: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter().try_fold(self, |config, id| {
            let id = id.as_ref();
            Technique::from_id(id)
                .map(|technique| config.with(technique, false))
                .ok_or_else(|| ConfigError::UnknownTechnique(id.to_string()))
        })
    }

    /// Enabled techniques in canonical execution order
    pub fn enabled_techniques(&self) -> Vec<Technique> {
        Technique::ALL
            .into_iter()
            .filter(|t| self.is_enabled(*t))
            .collect()
    }
}
