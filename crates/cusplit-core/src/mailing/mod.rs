//! Message rendering for matched records.
//!
//! Nothing is sent from here: deliverable results are turned into rendered
//! messages that a transport (or a person) can pick up from the manifest.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::config::MailConfig;
use crate::models::matching::MatchReport;
use crate::models::record::{ExportNamer, title_case};

/// Subject used when none is configured.
pub const DEFAULT_SUBJECT: &str = "Certificazione Unica {anno}";

/// HTML body used when none is configured.
pub const DEFAULT_BODY: &str = "<p>Gentile {nome} {cognome},</p>\
<p>in allegato trova la Sua Certificazione Unica {anno}.</p>\
<p>Cordiali saluti</p>";

/// Replace `{nome}`, `{cognome}` (title-cased) and `{anno}` in a template.
pub fn render_template(template: &str, given_name: &str, surname: &str, year: &str) -> String {
    template
        .replace("{nome}", &title_case(given_name))
        .replace("{cognome}", &title_case(surname))
        .replace("{anno}", year)
}

/// Subject and body templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailTemplate {
    pub subject: String,
    pub body: String,
}

impl MailTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn from_config(config: &MailConfig) -> Self {
        Self::new(config.subject.clone(), config.body.clone())
    }
}

impl Default for MailTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT, DEFAULT_BODY)
    }
}

/// One rendered message with its attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Recipient address.
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// File name of the split PDF to attach.
    pub attachment: String,
    /// Record the message is about.
    pub record_index: i32,
    /// First page, 0-based.
    pub start_page: i32,
    /// Last page, 0-based inclusive.
    pub end_page: i32,
}

/// Rendered messages of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryManifest {
    /// Local time the manifest was produced.
    pub generated_at: String,
    pub deliveries: Vec<Delivery>,
}

impl DeliveryManifest {
    pub fn new(deliveries: Vec<Delivery>) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            deliveries,
        }
    }
}

/// Year for records whose header carried none.
pub fn resolve_fallback_year(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().year().to_string())
}

/// Render one message per deliverable result, in report order.
///
/// Attachment names are unique across the report's records, numbered the
/// same way `PdfExporter::export_all` numbers its files.
pub fn prepare_deliveries(
    report: &MatchReport,
    template: &MailTemplate,
    fallback_year: &str,
) -> Vec<Delivery> {
    let mut namer = ExportNamer::new();
    let mut deliveries = Vec::new();

    for result in report.results.iter().filter(|r| !r.record.is_placeholder()) {
        let record = &result.record;
        let attachment = namer.assign(record);
        if !result.is_deliverable() {
            continue;
        }

        let year = if record.year.is_empty() {
            fallback_year
        } else {
            record.year.as_str()
        };
        debug!("Rendering message for record {} to {}", record.index, result.email);
        deliveries.push(Delivery {
            to: result.email.trim().to_string(),
            subject: render_template(&template.subject, &record.given_name, &record.surname, year),
            body: render_template(&template.body, &record.given_name, &record.surname, year),
            attachment,
            record_index: record.index,
            start_page: record.start_page,
            end_page: record.end_page,
        });
    }

    info!(
        "Prepared {} messages from {} results",
        deliveries.len(),
        report.results.len()
    );
    deliveries
}
