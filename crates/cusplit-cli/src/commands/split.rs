//! Split command - segment a CU batch and export one PDF per record.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use cusplit_core::models::record::{StructuredRecord, export_names};
use cusplit_core::pdf::{ExportedFile, PdfExporter, bundle_zip, zip_name};
use cusplit_core::segment::{DocumentSegmenter, RecordSegmenter, SegmentationResult};

use super::input::{load_config, load_input};

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input file (PDF or form-feed separated text)
    #[arg(required = true)]
    input: PathBuf,

    /// Directory for the per-record PDFs
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Also bundle the PDFs into a ZIP archive
    #[arg(long)]
    zip: bool,

    /// Report file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Do not merge adjacent records sharing a tax code
    #[arg(long)]
    no_merge: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: SplitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let input = load_input(&args.input)?;
    let segmenter = DocumentSegmenter::from_config(&config)
        .with_merge(config.segmentation.merge_same_tax_code && !args.no_merge);
    let result = segmenter.segment(&input.pages);

    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let report = format_segmentation(&result, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &report)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", report);
    }

    if let Some(output_dir) = &args.output_dir {
        match &input.exporter {
            Some(exporter) => {
                let zip = args.zip || config.export.zip;
                let written = export_records(exporter, &result.records, output_dir, zip)?;
                println!(
                    "{} Wrote {} files to {}",
                    style("✓").green(),
                    written,
                    output_dir.display()
                );
            }
            None => warn!(
                "{} is not a PDF, nothing to export",
                args.input.display()
            ),
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Export every record into `output_dir`, optionally with a ZIP bundle.
/// Returns the number of files written.
pub fn export_records(
    exporter: &PdfExporter,
    records: &[StructuredRecord],
    output_dir: &Path,
    zip: bool,
) -> anyhow::Result<usize> {
    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let files = exporter.export_all(records)?;
    for file in &files {
        pb.set_message(file.name.clone());
        write_file(output_dir, file)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut written = files.len();
    if zip {
        let archive = output_dir.join(zip_name(records));
        fs::write(&archive, bundle_zip(&files)?)?;
        info!("Wrote archive {}", archive.display());
        written += 1;
    }
    Ok(written)
}

fn write_file(dir: &Path, file: &ExportedFile) -> anyhow::Result<()> {
    let path = dir.join(&file.name);
    fs::write(&path, &file.data)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn format_segmentation(
    result: &SegmentationResult,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_records_csv(&result.records),
        OutputFormat::Text => Ok(format_records_text(result)),
    }
}

fn format_records_csv(records: &[StructuredRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "index",
        "start_page",
        "end_page",
        "year",
        "tax_code",
        "surname",
        "given_name",
        "file",
    ])?;

    for (record, file) in records.iter().zip(export_names(records)) {
        wtr.write_record([
            &record.index.to_string(),
            &record.start_page.to_string(),
            &record.end_page.to_string(),
            &record.year,
            &record.tax_code,
            &record.surname,
            &record.given_name,
            &file,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_records_text(result: &SegmentationResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} records in {} pages ({} headers)\n",
        result.records.len(),
        result.page_count,
        result.boundaries.len()
    ));
    output.push('\n');

    let files = export_names(&result.records);
    for (record, file) in result.records.iter().zip(files) {
        output.push_str(&format!(
            "{:>3}. pages {:<7} {:<16} {} {}\n",
            record.index,
            record.pages_label(),
            if record.tax_code.is_empty() { "-" } else { record.tax_code.as_str() },
            record.surname,
            record.given_name
        ));
        output.push_str(&format!("     {}\n", file));
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
