//! End-to-end scenarios over synthetic images.
//!
//! - A noisy camera-like JPEG with complete EXIF tags only trips the
//!   spectral uniformity check, and passes once that check is off
//! - A smooth, metadata-free synthetic image is flagged as generated
//! - Repeated analyses are byte-identical

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use image_tamper_detector::core::findings::{AnalysisReport, Severity, Technique};
use image_tamper_detector::core::metadata::{
    MetadataTags, TagGroup, TAG_DATE_TIME, TAG_DATE_TIME_ORIGINAL, TAG_MAKE, TAG_MODEL,
    TAG_SOFTWARE,
};
use image_tamper_detector::core::pipeline::Analyzer;
use image_tamper_detector::core::raster::{decode_bytes, ChannelLayout, RasterImage};

const SIDE: u32 = 192;

/// Camera-like frame: flat exposure plus sensor noise, stored as JPEG
fn camera_photo() -> RasterImage {
    let mut state = 2024u32;
    let image = RgbImage::from_fn(SIDE, SIDE, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        let noise = ((state >> 16) % 51) as i32 - 25;
        let v = (120 + noise) as u8;
        Rgb([v, v, v])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode_image(&image)
        .unwrap();
    decode_bytes(bytes).unwrap()
}

fn camera_tags() -> MetadataTags {
    MetadataTags::parsed()
        .with_tag(TagGroup::Image, TAG_MAKE, "NIKON CORPORATION")
        .with_tag(TagGroup::Image, TAG_MODEL, "NIKON D750")
        .with_tag(TagGroup::Image, TAG_SOFTWARE, "Ver.1.00")
        .with_tag(TagGroup::Image, TAG_DATE_TIME, "2024:05:11 14:03:27")
        .with_tag(TagGroup::Exif, TAG_DATE_TIME_ORIGINAL, "2024:05:11 14:03:27")
}

/// Smooth synthetic render with no texture or sensor noise
fn synthetic_render() -> RasterImage {
    let pixels = (0..SIDE * SIDE)
        .map(|i| {
            let (x, y) = ((i % SIDE) as f64, (i / SIDE) as f64);
            (128.0 + 40.0 * (x / 20.0).sin() * (y / 25.0).cos()).round() as u8
        })
        .collect();
    RasterImage::new(SIDE, SIDE, ChannelLayout::Gray, pixels).unwrap()
}

fn assert_well_formed(report: &AnalysisReport) {
    assert!((0.0..=1.0).contains(&report.confidence_score));
    for finding in &report.findings {
        assert!(
            (0.0..=1.0).contains(&finding.score),
            "{} scored {}",
            finding.technique,
            finding.score
        );
    }
    assert_eq!(
        report.tampering_detected,
        report.confidence_score > 0.35,
        "verdict must follow the confidence score"
    );
}

#[test]
fn camera_photo_only_trips_the_spectral_uniformity_check() {
    let report = Analyzer::default().analyze(&camera_photo(), &camera_tags());

    assert_well_formed(&report);
    assert!(report.metadata_issues.is_empty(), "{:?}", report.metadata_issues);
    let ai = report.finding(Technique::AiGenerated).unwrap();
    assert!(!ai.triggered);

    // A log-magnitude spectrum of sensor noise is flat enough to read as over-uniform
    let triggered: Vec<Technique> = report.triggered_findings().map(|f| f.technique).collect();
    assert_eq!(triggered, vec![Technique::FrequencyDomain], "{:#?}", report.findings);
    let frequency = report.finding(Technique::FrequencyDomain).unwrap();
    assert_eq!(frequency.severity, Severity::Medium);
    assert!((report.confidence_score - 0.6).abs() < 1e-12);
}

#[test]
fn camera_photo_is_not_flagged_by_pixel_heuristics() {
    let analyzer = Analyzer::builder()
        .disable(Technique::FrequencyDomain)
        .build()
        .unwrap();
    let report = analyzer.analyze(&camera_photo(), &camera_tags());

    assert_well_formed(&report);
    assert!(!report.tampering_detected, "{:#?}", report);
    assert_eq!(report.confidence_score, 0.0);
}

#[test]
fn synthetic_render_is_flagged_as_generated() {
    let report = Analyzer::default().analyze(&synthetic_render(), &MetadataTags::absent());

    assert_well_formed(&report);
    let ai = report.finding(Technique::AiGenerated).unwrap();
    assert!(ai.triggered, "{:?}", ai);
    assert!(ai.score >= 0.5);

    assert!(report.confidence_score > 0.35, "{:#?}", report);
    assert!(report.tampering_detected);
}

#[test]
fn identical_input_gives_identical_report() {
    let analyzer = Analyzer::default();
    let image = synthetic_render();
    let tags = MetadataTags::absent();

    let first = serde_json::to_string(&analyzer.analyze(&image, &tags)).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(&image, &tags)).unwrap();
    assert_eq!(first, second);

    let photo = camera_photo();
    let first = analyzer.analyze(&photo, &camera_tags());
    let second = analyzer.analyze(&photo, &camera_tags());
    assert_eq!(first, second);
}

#[test]
fn silent_detectors_and_clean_metadata_mean_zero_confidence() {
    let flat = RasterImage::new(SIDE, SIDE, ChannelLayout::Rgb, vec![128; (SIDE * SIDE * 3) as usize])
        .unwrap();
    // Only techniques that stay silent on a flat frame
    let analyzer = Analyzer::builder()
        .disable(Technique::AiGenerated)
        .build()
        .unwrap();

    let report = analyzer.analyze(&flat, &camera_tags());

    assert!(report.triggered_findings().next().is_none(), "{:#?}", report.findings);
    assert_eq!(report.confidence_score, 0.0);
    assert!(!report.tampering_detected);
}
