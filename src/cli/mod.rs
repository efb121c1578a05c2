//! # CLI Module
//!
//! Command-line interface for the image tamper detector.
//!
//! ## Usage
//! ```bash
//! # Analyze a directory of uploads
//! tamper-check analyze ~/uploads
//!
//! # With calibrated thresholds
//! tamper-check analyze ~/uploads --thresholds thresholds.json
//!
//! # Skip slow techniques
//! tamper-check analyze receipt.jpg --disable copy_move --disable double_compression
//!
//! # JSON output
//! tamper-check analyze ~/uploads --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, StyledObject, Term};
use image_tamper_detector::core::config::{AnalysisConfig, ThresholdConfig};
use image_tamper_detector::core::findings::{Severity, Technique};
use image_tamper_detector::core::pipeline::{Analyzer, ImageReport, Pipeline, PipelineResult};
use image_tamper_detector::error::Result;
use image_tamper_detector::events::{BatchEvent, Event, EventChannel, PipelineEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;

/// Image Tamper Detector - explain why an image looks manipulated
#[derive(Parser, Debug)]
#[command(name = "tamper-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze images for signs of tampering
    Analyze {
        /// Image files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// JSON file of threshold overrides
        #[arg(short, long)]
        thresholds: Option<PathBuf>,

        /// Technique to skip (repeatable, see `techniques`)
        #[arg(short, long, value_name = "TECHNIQUE")]
        disable: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// List technique identifiers accepted by --disable
    Techniques,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (flagged paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    image_tamper_detector::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            paths,
            thresholds,
            disable,
            output,
            include_hidden,
            verbose,
        } => run_analyze(paths, thresholds, disable, output, include_hidden, verbose),
        Commands::Techniques => {
            for technique in Technique::ALL {
                println!("{:<20} {}", technique.id(), technique);
            }
            Ok(())
        }
    }
}

fn run_analyze(
    paths: Vec<PathBuf>,
    thresholds_path: Option<PathBuf>,
    disable: Vec<String>,
    output: OutputFormat,
    include_hidden: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Image Tamper Detector").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Configuration is fixed before any image is touched
    let thresholds = match thresholds_path {
        Some(path) => ThresholdConfig::from_file(&path)?,
        None => ThresholdConfig::default(),
    };
    let analyzer = Analyzer::builder()
        .thresholds(thresholds)
        .config(AnalysisConfig::default().disable_ids(&disable)?)
        .build()?;

    let pipeline = Pipeline::builder()
        .paths(paths)
        .analyzer(analyzer)
        .include_hidden(include_hidden)
        .build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Batch(BatchEvent::Discovered { total_images }) => {
                    pb.set_length(total_images as u64);
                }
                Event::Batch(BatchEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Batch(BatchEvent::Error { path, message }) if verbose => {
                    pb.println(format!("{} {}: {}", style("!").yellow(), path.display(), message));
                }
                Event::Pipeline(PipelineEvent::Completed { .. } | PipelineEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    let result = result?;

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result),
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Analysis Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images analyzed in {:.1}s",
        style(result.reports.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    let flagged = result.flagged().count();
    term.write_line(&format!(
        "  {} flagged as likely tampered",
        if flagged > 0 {
            style(flagged).red().bold()
        } else {
            style(flagged).cyan()
        }
    ))
    .ok();

    if !result.errors.is_empty() {
        term.write_line(&format!(
            "  {} could not be analyzed",
            style(result.errors.len()).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    for image in &result.reports {
        if image.report.tampering_detected || verbose {
            print_image_report(term, image, verbose);
        }
    }

    if flagged == 0 && !result.reports.is_empty() {
        term.write_line(&format!("  {} No signs of tampering found", style("✓").green()))
            .ok();
        term.write_line("").ok();
    }

    if verbose {
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error)).ok();
        }
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("Scores are evidence, not proof. Review flagged images by hand.").dim()
    ))
    .ok();
}

fn print_image_report(term: &Term, image: &ImageReport, verbose: bool) {
    let report = &image.report;
    let marker = if report.tampering_detected {
        style("⚠").red().bold()
    } else {
        style("○").dim()
    };
    term.write_line(&format!(
        "  {} {} ({:.0}% confidence)",
        marker,
        image.path.display(),
        report.confidence_score * 100.0
    ))
    .ok();

    for finding in &report.findings {
        if finding.triggered || verbose {
            term.write_line(&format!(
                "    {} {}: {}",
                severity_label(finding.severity),
                style(finding.technique).bold(),
                finding.description
            ))
            .ok();
        }
    }

    for anomaly in &report.metadata_issues {
        term.write_line(&format!(
            "    {} {}: {}",
            severity_label(anomaly.severity),
            style(anomaly.kind).bold(),
            anomaly.description
        ))
        .ok();
    }

    term.write_line("").ok();
}

fn severity_label(severity: Severity) -> StyledObject<String> {
    let label = format!("[{}]", severity);
    match severity {
        Severity::Critical => style(label).red().bold(),
        Severity::High => style(label).red(),
        Severity::Medium => style(label).yellow(),
        Severity::Low => style(label).green(),
        Severity::Info => style(label).dim(),
    }
}

fn print_json_results(result: &PipelineResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize results: {}", e),
    }
}

fn print_minimal_results(result: &PipelineResult) {
    for image in result.flagged() {
        println!(
            "{}\t{:.3}",
            image.path.display(),
            image.report.confidence_score
        );
    }
}
