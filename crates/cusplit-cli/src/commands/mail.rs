//! Mail command - render one message per matched record.
//!
//! Messages are not sent: the attachments and a `deliveries.json` manifest
//! are written to the output directory for a mail transport to pick up.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, warn};

use cusplit_core::mailing::{
    DeliveryManifest, MailTemplate, prepare_deliveries, resolve_fallback_year,
};
use cusplit_core::models::matching::MatchStatus;

use super::input::load_config;
use super::matching::match_files;

/// Manifest file name inside the output directory.
const MANIFEST_NAME: &str = "deliveries.json";

/// Arguments for the mail command.
#[derive(Args)]
pub struct MailArgs {
    /// Input file (PDF or form-feed separated text)
    #[arg(required = true)]
    input: PathBuf,

    /// Roster file (CSV, XLSX, XLS, XLSM, XLSB or ODS)
    #[arg(required = true)]
    roster: PathBuf,

    /// Output directory for attachments and the delivery manifest
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Subject template ({nome}, {cognome}, {anno})
    #[arg(long)]
    subject: Option<String>,

    /// HTML body template file
    #[arg(long)]
    body: Option<PathBuf>,

    /// Year used for records without one
    #[arg(long)]
    year: Option<String>,

    /// Minimum fuzzy name score (0-100)
    #[arg(short, long)]
    threshold: Option<u8>,
}

pub fn run(args: MailArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let mut template = MailTemplate::from_config(&config.mail);
    if let Some(subject) = args.subject {
        template.subject = subject;
    }
    if let Some(body_path) = &args.body {
        if !body_path.exists() {
            anyhow::bail!("Body template not found: {}", body_path.display());
        }
        template.body = fs::read_to_string(body_path)?;
    }

    let run = match_files(&args.input, &args.roster, args.threshold, &config)?;
    let fallback_year =
        resolve_fallback_year(args.year.as_deref().or(config.mail.fallback_year.as_deref()));
    let deliveries = prepare_deliveries(&run.report, &template, &fallback_year);

    fs::create_dir_all(&args.output_dir)?;

    match &run.input.exporter {
        Some(exporter) => {
            for delivery in &deliveries {
                let data = exporter.export_range(delivery.start_page, delivery.end_page)?;
                let path = args.output_dir.join(&delivery.attachment);
                fs::write(&path, data)?;
                debug!("Wrote attachment {}", path.display());
            }
        }
        None => warn!(
            "{} is not a PDF, attachments not written",
            args.input.display()
        ),
    }

    let records = run.report.results.len() - run.report.count(MatchStatus::RosterUnmatched);
    let skipped = records.saturating_sub(run.report.deliverable().count());
    let manifest = DeliveryManifest::new(deliveries);
    let manifest_path = args.output_dir.join(MANIFEST_NAME);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    println!(
        "{} Prepared {} messages in {}",
        style("✓").green(),
        manifest.deliveries.len(),
        manifest_path.display()
    );
    if skipped > 0 {
        println!(
            "{} {} records have no email address",
            style("⚠").yellow(),
            skipped
        );
    }

    Ok(())
}
