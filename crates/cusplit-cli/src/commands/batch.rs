//! Batch command - split many CU batches in one run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use cusplit_core::models::config::CuConfig;
use cusplit_core::segment::{DocumentSegmenter, RecordSegmenter, SegmentationResult};

use super::input::{is_supported_input, load_config, load_input};
use super::split::{OutputFormat, export_records, format_segmentation};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory; each input gets a sub-directory named after it
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Report format for each input
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also bundle each input's PDFs into a ZIP archive
    #[arg(long)]
    zip: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    segmentation: Option<SegmentationResult>,
    files_written: usize,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported_input(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let segmenter = DocumentSegmenter::from_config(&config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &segmenter, &args, &config);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok((segmentation, files_written)) => {
                results.push(ProcessResult {
                    path: path.clone(),
                    segmentation: Some(segmentation),
                    files_written,
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path: path.clone(),
                        segmentation: None,
                        files_written: 0,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.segmentation.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let records: usize = results
        .iter()
        .filter_map(|r| r.segmentation.as_ref())
        .map(|s| s.records.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files ({} records) in {:?}",
        style("✓").green(),
        results.len(),
        records,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    segmenter: &DocumentSegmenter,
    args: &BatchArgs,
    config: &CuConfig,
) -> anyhow::Result<(SegmentationResult, usize)> {
    let input = load_input(path)?;
    let segmentation = segmenter.segment(&input.pages);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("batch");
    let target = args.output_dir.join(stem);
    fs::create_dir_all(&target)?;

    let extension = match args.format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
        OutputFormat::Text => "txt",
    };
    let report_path = target.join(format!("records.{}", extension));
    fs::write(&report_path, format_segmentation(&segmentation, args.format)?)?;
    debug!("Wrote report to {}", report_path.display());

    let files_written = match &input.exporter {
        Some(exporter) => export_records(
            exporter,
            &segmentation.records,
            &target,
            args.zip || config.export.zip,
        )?,
        None => 0,
    };

    Ok((segmentation, files_written))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "records",
        "missing_tax_code",
        "warnings",
        "files_written",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(segmentation) = &result.segmentation {
            let missing = segmentation
                .records
                .iter()
                .filter(|r| r.tax_code.is_empty())
                .count();
            wtr.write_record([
                filename,
                "success",
                &segmentation.page_count.to_string(),
                &segmentation.records.len().to_string(),
                &missing.to_string(),
                &segmentation.warnings.len().to_string(),
                &result.files_written.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "0",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
