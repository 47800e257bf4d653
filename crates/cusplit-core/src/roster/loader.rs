//! Roster decoding from CSV text or spreadsheet workbooks.

use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, open_workbook_auto_from_rs};
use encoding_rs::WINDOWS_1252;
use tracing::{debug, info, warn};

use super::Result;
use super::columns::ColumnMap;
use crate::error::RosterError;
use crate::models::config::RosterConfig;
use crate::models::roster::RosterEntry;

/// Delimiters considered by the sniffer, in preference order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Roster file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    /// Delimited text.
    Csv,
    /// Excel or OpenDocument workbook.
    Spreadsheet,
}

impl RosterFormat {
    /// Detect format from a file extension.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "csv" | "txt" | "tsv" => Ok(RosterFormat::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(RosterFormat::Spreadsheet),
            other => Err(RosterError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Detect format from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// Loads roster entries from raw bytes.
pub struct RosterLoader {
    fallback_delimiter: char,
    sniff_lines: usize,
}

impl RosterLoader {
    /// Create a loader with default settings.
    pub fn new() -> Self {
        Self::from_config(&RosterConfig::default())
    }

    pub fn from_config(config: &RosterConfig) -> Self {
        Self {
            fallback_delimiter: config.fallback_delimiter,
            sniff_lines: config.sniff_lines.max(1),
        }
    }

    /// Load a roster file, choosing the format from its extension.
    pub fn load_file(&self, path: &Path) -> crate::error::Result<Vec<RosterEntry>> {
        let format = RosterFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        Ok(self.load(&bytes, format)?)
    }

    /// Decode roster entries; rows without surname, given name and tax code are dropped.
    pub fn load(&self, bytes: &[u8], format: RosterFormat) -> Result<Vec<RosterEntry>> {
        let table = match format {
            RosterFormat::Csv => self.read_csv(bytes)?,
            RosterFormat::Spreadsheet => read_spreadsheet(bytes)?,
        };

        let Some((headers, rows)) = table.split_first() else {
            warn!("Roster is empty");
            return Ok(Vec::new());
        };

        let columns = ColumnMap::from_headers(headers);
        if !columns.unmapped.is_empty() {
            debug!("Ignoring roster columns: {}", columns.unmapped.join(", "));
        }
        if !columns.is_usable() {
            warn!("No surname, name or tax code column in roster header");
        }

        let entries: Vec<RosterEntry> = rows
            .iter()
            .map(|row| {
                let cell = |position: Option<usize>| {
                    position
                        .and_then(|p| row.get(p))
                        .map(|value| clean_cell(value))
                        .unwrap_or("")
                };
                RosterEntry::new(
                    cell(columns.surname),
                    cell(columns.given_name),
                    cell(columns.tax_code),
                    cell(columns.email),
                )
            })
            .filter(|entry| !entry.is_blank())
            .collect();

        info!("Loaded {} roster entries from {} rows", entries.len(), rows.len());
        Ok(entries)
    }

    fn read_csv(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let text = decode_text(bytes)?;
        let delimiter = self.sniff_delimiter(&text);
        debug!("Using roster delimiter {:?}", delimiter);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut table = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            table.push(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    /// Pick the delimiter that appears most often with the same count on
    /// every sampled line; the fallback when none is consistent.
    pub fn sniff_delimiter(&self, text: &str) -> char {
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(self.sniff_lines)
            .collect();

        let mut best: Option<(char, usize)> = None;
        for delimiter in DELIMITERS {
            let counts: Vec<usize> = lines.iter().map(|l| count_unquoted(l, delimiter)).collect();
            let Some(&first) = counts.first() else {
                break;
            };
            if first == 0 || counts.iter().any(|&c| c != first) {
                continue;
            }
            if best.is_none_or(|(_, count)| first > count) {
                best = Some((delimiter, first));
            }
        }

        best.map(|(delimiter, _)| delimiter)
            .unwrap_or(self.fallback_delimiter)
    }
}

impl Default for RosterLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 (BOM stripped), falling back to Windows-1252.
fn decode_text(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            debug!("Roster is not valid UTF-8, decoding as Windows-1252");
            WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned())
                .ok_or_else(|| RosterError::Decode("neither UTF-8 nor Windows-1252".to_string()))
        }
    }
}

fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if c == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Trimmed cell value; `nan` left behind by spreadsheet exports counts as empty.
fn clean_cell(value: &str) -> &str {
    let value = value.trim();
    if value.eq_ignore_ascii_case("nan") { "" } else { value }
}

/// First worksheet of a workbook as rows of display strings.
fn read_spreadsheet(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| RosterError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RosterError::Spreadsheet("workbook has no worksheet".to_string()))?
        .map_err(|e| RosterError::Spreadsheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect())
}
