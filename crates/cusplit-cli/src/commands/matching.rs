//! Match command - reconcile a CU batch against an employee roster.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use cusplit_core::matching::MatchingEngine;
use cusplit_core::models::config::CuConfig;
use cusplit_core::models::matching::{MatchMethod, MatchReport, MatchStatus};
use cusplit_core::models::roster::RosterEntry;
use cusplit_core::roster::RosterLoader;
use cusplit_core::segment::{DocumentSegmenter, RecordSegmenter};

use super::input::{LoadedInput, load_config, load_input};
use super::split::OutputFormat;

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// Input file (PDF or form-feed separated text)
    #[arg(required = true)]
    input: PathBuf,

    /// Roster file (CSV, XLSX, XLS, XLSM, XLSB or ODS)
    #[arg(required = true)]
    roster: PathBuf,

    /// Minimum fuzzy name score (0-100)
    #[arg(short, long)]
    threshold: Option<u8>,

    /// Report file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Everything one matching run produced.
pub struct MatchRun {
    pub input: LoadedInput,
    pub roster: Vec<RosterEntry>,
    pub report: MatchReport,
}

/// Segment `input`, load `roster` and match them.
pub fn match_files(
    input: &Path,
    roster: &Path,
    threshold: Option<u8>,
    config: &CuConfig,
) -> anyhow::Result<MatchRun> {
    if let Some(threshold) = threshold {
        if threshold > 100 {
            anyhow::bail!("Threshold must be between 0 and 100, got {}", threshold);
        }
    }
    if !roster.exists() {
        anyhow::bail!("Roster file not found: {}", roster.display());
    }

    let input = load_input(input)?;
    let segmentation = DocumentSegmenter::from_config(config).segment(&input.pages);

    let entries = RosterLoader::from_config(&config.roster).load_file(roster)?;
    info!("Roster has {} entries", entries.len());

    let engine = MatchingEngine::from_config(&config.matching)
        .with_threshold(threshold.unwrap_or(config.matching.threshold));
    let report = engine.run(&segmentation.records, &entries);

    Ok(MatchRun {
        input,
        roster: entries,
        report,
    })
}

pub fn run(args: MatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let run = match_files(&args.input, &args.roster, args.threshold, &config)?;

    let output = format_report(&run.report, &run.roster, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    print_counts(&run.report, run.roster.len());
    Ok(())
}

fn print_counts(report: &MatchReport, roster_len: usize) {
    eprintln!(
        "{} {} roster entries: {} matched, {} records without roster entry, {} roster entries without record",
        style("ℹ").blue(),
        roster_len,
        style(report.count(MatchStatus::Matched)).green(),
        style(report.count(MatchStatus::RecordUnmatched)).yellow(),
        style(report.count(MatchStatus::RosterUnmatched)).yellow()
    );
}

pub fn format_report(
    report: &MatchReport,
    roster: &[RosterEntry],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_report_csv(report),
        OutputFormat::Text => Ok(format_report_text(report, roster)),
    }
}

fn format_report_csv(report: &MatchReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "index",
        "status",
        "pages",
        "surname",
        "given_name",
        "tax_code",
        "email",
        "score",
        "method",
    ])?;

    for result in &report.results {
        let record = &result.record;
        wtr.write_record([
            &record.index.to_string(),
            &result.status.to_string(),
            &record.pages_label(),
            &record.surname,
            &record.given_name,
            &record.tax_code,
            &result.email,
            &result.score.to_string(),
            &result.method.map(|m| m.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// One line per result; fuzzy matches also show the roster name they matched.
fn format_report_text(report: &MatchReport, roster: &[RosterEntry]) -> String {
    let mut output = String::new();

    for result in &report.results {
        let record = &result.record;
        let label = match result.status {
            MatchStatus::Matched => "MATCHED",
            MatchStatus::RecordUnmatched => "NO ROSTER",
            MatchStatus::RosterUnmatched => "NO CU",
        };
        output.push_str(&format!(
            "{:<10} pages {:<7} {} {} [{}]",
            label,
            record.pages_label(),
            record.surname,
            record.given_name,
            if record.tax_code.is_empty() { "-" } else { record.tax_code.as_str() }
        ));
        if let Some(method) = result.method {
            output.push_str(&format!(" {} ({}, {})", result.email, method, result.score));
            if method == MatchMethod::FuzzyName {
                if let Some(entry) = result.entry(roster) {
                    output.push_str(&format!(" ~ {} {}", entry.surname, entry.given_name));
                }
            }
        } else if !result.email.is_empty() {
            output.push_str(&format!(" {}", result.email));
        }
        output.push('\n');
    }

    output
}
