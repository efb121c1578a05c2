//! Heuristics for synthetic (generated) images.
//!
//! Four additive signals, total capped at 1:
//! - unnaturally smooth: Laplacian variance below `ai_smoothness_variance` (+0.3)
//! - repetitive micro-texture: uniform LBP histogram uniformity above
//!   `ai_texture_uniformity` (+0.3)
//! - missing sensor noise: residual against a 5x5 Gaussian blur with a
//!   standard deviation below `ai_noise_floor` (+0.25)
//! - metadata: a generator named in the Software tag (+0.4, severity
//!   critical), otherwise no camera make and model (+0.15)

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{clamp_score, Finding, Severity, Technique};
use crate::core::metadata::{MetadataTags, TAG_SOFTWARE};
use crate::core::signal::filters::{gaussian_blur, laplacian};
use crate::core::signal::texture::{uniform_lbp_histogram, uniformity};
use crate::core::signal::{std_dev, variance, Plane};
use crate::error::DetectorError;

const SMOOTHNESS_WEIGHT: f64 = 0.3;
const TEXTURE_WEIGHT: f64 = 0.3;
const NOISE_WEIGHT: f64 = 0.25;
const AI_SOFTWARE_WEIGHT: f64 = 0.4;
const NO_CAMERA_WEIGHT: f64 = 0.15;

const LBP_POINTS: usize = 24;
const LBP_RADIUS: f64 = 3.0;
const BLUR_SIZE: usize = 5;

/// Generator names; short tokens only match as whole words
static AI_SOFTWARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(midjourney|stable[ _-]?diffusion|dall-?e|ai|gan|neural|synthetic|generated)\b")
        .expect("AI software pattern is valid")
});

/// AI-generated image heuristic detector
pub struct AiGeneratedDetector;

/// Signals that fired, with the accumulated score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiIndicators {
    pub score: f64,
    pub indicators: Vec<String>,
    pub generator_named: bool,
}

impl AiIndicators {
    fn add(&mut self, weight: f64, indicator: impl Into<String>) {
        self.score += weight;
        self.indicators.push(indicator.into());
    }
}

impl AiGeneratedDetector {
    /// Generator named by a Software tag, if any
    pub fn generator_in(software: &str) -> Option<&str> {
        AI_SOFTWARE.find(software).map(|m| m.as_str())
    }

    /// Evaluate every heuristic
    pub fn indicators(gray: &Plane, tags: &MetadataTags, thresholds: &ThresholdConfig) -> AiIndicators {
        let mut found = AiIndicators::default();

        let edge_energy = variance(laplacian(gray).data());
        if edge_energy < thresholds.ai_smoothness_variance {
            found.add(SMOOTHNESS_WEIGHT, "Unnaturally smooth textures");
        }

        let lbp = uniform_lbp_histogram(gray, LBP_POINTS, LBP_RADIUS);
        let texture_uniformity = uniformity(&lbp);
        if !lbp.is_empty() && texture_uniformity > thresholds.ai_texture_uniformity {
            found.add(TEXTURE_WEIGHT, "Repetitive patterns detected");
        }

        let noise = std_dev(gray.sub(&gaussian_blur(gray, BLUR_SIZE, 0.0)).data());
        if noise < thresholds.ai_noise_floor {
            found.add(NOISE_WEIGHT, "Lack of natural camera noise");
        }

        let generator = tags.get(TAG_SOFTWARE).and_then(Self::generator_in);
        if let Some(name) = generator {
            found.generator_named = true;
            found.add(AI_SOFTWARE_WEIGHT, format!("AI software detected: {}", name));
        } else if tags.lacks_camera() {
            found.add(NO_CAMERA_WEIGHT, "Missing camera metadata");
        }

        debug!(
            edge_energy,
            texture_uniformity,
            noise,
            score = found.score,
            "AI heuristics"
        );
        found.score = clamp_score(found.score);
        found
    }
}

impl Detector for AiGeneratedDetector {
    fn technique(&self) -> Technique {
        Technique::AiGenerated
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let gray = Plane::from_gray(&input.image.luma());
        let found = Self::indicators(&gray, input.tags, thresholds);

        if found.score > thresholds.ai_generated_threshold {
            let finding = Finding::triggered(
                Technique::AiGenerated,
                found.score,
                format!(
                    "AI-generated image likely. Score: {:.0}%. Indicators: {}",
                    found.score * 100.0,
                    found.indicators.join(", ")
                ),
            );
            Ok(if found.generator_named {
                finding.with_severity(Severity::Critical)
            } else {
                finding
            })
        } else {
            Ok(Finding::clear(
                Technique::AiGenerated,
                format!(
                    "No strong AI-generation indicators (Score: {:.0}%)",
                    found.score * 100.0
                ),
            ))
        }
    }
}
