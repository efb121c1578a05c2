//! Integration tests for the pipeline module.
//!
//! These tests verify end-to-end batch behavior including:
//! - Empty directories
//! - Nonexistent paths
//! - Corrupt and degenerate files
//! - Real encoded images on disk

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use image_tamper_detector::core::findings::{Severity, Technique};
use image_tamper_detector::core::pipeline::{Analyzer, Pipeline};
use image_tamper_detector::events::{BatchEvent, Event, EventChannel, PipelineEvent};
use image_tamper_detector::TamperError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a 1x1 PNG image
fn create_test_png(path: &Path) -> image::ImageResult<()> {
    RgbImage::from_pixel(1, 1, Rgb([200, 40, 40])).save(path)
}

/// Write a noisy 128x128 photo-like JPEG
fn create_test_jpeg(path: &Path) {
    let mut state = 7u32;
    let image = RgbImage::from_fn(128, 128, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        let v = (110 + (state >> 16) % 40) as u8;
        Rgb([v, v, v])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode_image(&image)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn pipeline_handles_empty_directory() {
    let temp_dir = TempDir::new().unwrap();

    let result = Pipeline::builder()
        .paths(vec![temp_dir.path().to_path_buf()])
        .build()
        .run()
        .unwrap();

    assert_eq!(result.total_images, 0);
    assert!(result.reports.is_empty());
}

#[test]
fn pipeline_handles_corrupt_file_gracefully() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("corrupt.jpg"),
        b"this is not a valid image file",
    )
    .unwrap();
    create_test_jpeg(&temp_dir.path().join("photo.jpg"));

    let result = Pipeline::builder()
        .paths(vec![temp_dir.path().to_path_buf()])
        .build()
        .run()
        .unwrap();

    // The corrupt file is recorded, the good one still analyzed
    assert_eq!(result.total_images, 2);
    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.reports[0].path.ends_with("photo.jpg"));
}

#[test]
fn pipeline_rejects_nonexistent_path() {
    let result = Pipeline::builder()
        .paths(vec![PathBuf::from("/nonexistent/path/that/does/not/exist")])
        .build()
        .run();

    assert!(matches!(result, Err(TamperError::Scan(_))));
}

#[test]
fn single_pixel_image_degrades_without_failing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pixel.png");
    create_test_png(&path).unwrap();

    let report = Analyzer::default().analyze_file(&path).unwrap();

    assert_eq!(report.findings.len(), 7);
    assert!(report.findings.iter().all(|f| (0.0..=1.0).contains(&f.score)));
    for technique in [Technique::NoisePattern, Technique::Splicing, Technique::FrequencyDomain] {
        let finding = report.finding(technique).unwrap();
        assert!(!finding.triggered);
        assert_eq!(finding.severity, Severity::Info);
    }
    assert!((0.0..=1.0).contains(&report.confidence_score));
}

#[test]
fn jpeg_on_disk_produces_full_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("upload.jpg");
    create_test_jpeg(&path);

    let result = Pipeline::builder().paths(vec![path.clone()]).build().run().unwrap();

    assert_eq!(result.reports.len(), 1);
    let report = &result.reports[0].report;
    assert_eq!(report.techniques_used, Technique::ALL.to_vec());
    assert_eq!(report.findings.len(), 7);
    // Encoder output carries no EXIF block
    assert!(!report.metadata_issues.is_empty());
    assert!(report.findings.iter().all(|f| (0.0..=1.0).contains(&f.score)));
}

#[test]
fn pipeline_reports_progress_events() {
    let temp_dir = TempDir::new().unwrap();
    create_test_jpeg(&temp_dir.path().join("a.jpg"));
    create_test_jpeg(&temp_dir.path().join("b.jpg"));

    let (sender, receiver) = EventChannel::new();
    let result = Pipeline::builder()
        .paths(vec![temp_dir.path().to_path_buf()])
        .build()
        .run_with_events(&sender)
        .unwrap();
    drop(sender);

    let events: Vec<Event> = receiver.iter().collect();
    assert!(matches!(events.first(), Some(Event::Pipeline(PipelineEvent::Started))));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Batch(BatchEvent::Discovered { total_images: 2 }))));
    let progress = events
        .iter()
        .filter(|e| matches!(e, Event::Batch(BatchEvent::Progress(_))))
        .count();
    assert_eq!(progress, 2);
    match events.last() {
        Some(Event::Pipeline(PipelineEvent::Completed { summary })) => {
            assert_eq!(summary.total_images, 2);
            assert_eq!(summary.analyzed, result.reports.len());
            assert_eq!(summary.flagged, result.flagged().count());
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[test]
fn batch_results_serialize_with_flattened_reports() {
    let temp_dir = TempDir::new().unwrap();
    create_test_jpeg(&temp_dir.path().join("a.jpg"));

    let result = Pipeline::builder()
        .paths(vec![temp_dir.path().to_path_buf()])
        .build()
        .run()
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    let first = &json["reports"][0];
    assert!(first["path"].as_str().unwrap().ends_with("a.jpg"));
    assert!(first["confidence_score"].is_number());
    assert_eq!(first["techniques_used"][0], "error_level");
}
