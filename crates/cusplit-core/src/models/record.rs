//! Page text, record boundaries and structured CU records.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::segment::HeaderStrategy;

/// Placeholder used in export names when a name field is missing.
pub const NAME_PLACEHOLDER: &str = "Sconosciuto";

/// Placeholder used in export names when the tax code is missing.
pub const TAX_CODE_PLACEHOLDER: &str = "CFMANCANTE";

/// Marker for index and page fields of synthetic records.
pub const INVALID_POSITION: i32 = -1;

/// Form feed, the page separator in `pdftotext`-style dumps.
const PAGE_BREAK: char = '\u{000c}';

/// Ordered per-page text of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pages: Vec<String>,
}

impl PageText {
    /// Wrap already extracted page texts.
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Split a plain-text dump on form feeds.
    ///
    /// A trailing form feed (as written by `pdftotext`) does not produce an
    /// extra empty page.
    pub fn from_form_feed(text: &str) -> Self {
        let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self { pages }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Text of one page.
    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    /// All pages in order.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Concatenate an inclusive page range, each page followed by a newline.
    pub fn concat(&self, range: RangeInclusive<usize>) -> String {
        let mut text = String::new();
        for page in self.pages.iter().take(range.end() + 1).skip(*range.start()) {
            text.push_str(page);
            text.push('\n');
        }
        text
    }
}

impl From<Vec<String>> for PageText {
    fn from(pages: Vec<String>) -> Self {
        Self::new(pages)
    }
}

/// A page believed to start a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBoundary {
    /// 0-based page index.
    pub page: usize,

    /// Four-digit year found in the header.
    pub year: String,

    /// Header strategy that recognised the page.
    pub strategy: HeaderStrategy,
}

/// One person's certificate after segmentation and merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// 1-based position among records (-1 for roster placeholders).
    pub index: i32,

    /// First page, 0-based (-1 for roster placeholders).
    pub start_page: i32,

    /// Last page, 0-based inclusive (-1 for roster placeholders).
    pub end_page: i32,

    /// Year from the record header.
    pub year: String,

    /// Recipient tax code, empty when extraction failed.
    pub tax_code: String,

    /// Recipient surname, upper case.
    pub surname: String,

    /// Recipient given name, upper case.
    pub given_name: String,

    /// Concatenated text of the merged page range.
    #[serde(skip)]
    pub raw_text: String,
}

impl StructuredRecord {
    /// Synthetic record standing in for a roster entry with no certificate.
    pub fn placeholder(surname: &str, given_name: &str, tax_code: &str) -> Self {
        Self {
            index: INVALID_POSITION,
            start_page: INVALID_POSITION,
            end_page: INVALID_POSITION,
            year: String::new(),
            tax_code: tax_code.to_string(),
            surname: surname.to_string(),
            given_name: given_name.to_string(),
            raw_text: String::new(),
        }
    }

    /// Whether this record is a synthetic placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.start_page < 0 || self.end_page < 0
    }

    /// Page range in the source document, `None` for placeholders.
    pub fn page_range(&self) -> Option<RangeInclusive<usize>> {
        if self.is_placeholder() || self.end_page < self.start_page {
            return None;
        }
        Some(self.start_page as usize..=self.end_page as usize)
    }

    /// Number of pages covered.
    pub fn page_count(&self) -> usize {
        self.page_range().map(|r| r.count()).unwrap_or(0)
    }

    /// File name for the split document: `CU2025_Rossi_Mario_RSSMRA80A01H501U.pdf`.
    pub fn export_name(&self) -> String {
        let surname = name_component(&self.surname);
        let given_name = name_component(&self.given_name);
        let tax_code = if self.tax_code.trim().is_empty() {
            TAX_CODE_PLACEHOLDER.to_string()
        } else {
            self.tax_code.trim().to_uppercase()
        };
        format!("CU{}_{}_{}_{}.pdf", self.year, surname, given_name, tax_code)
    }

    /// Human readable page span, 1-based.
    pub fn pages_label(&self) -> String {
        match self.page_range() {
            Some(range) => format!("{}-{}", range.start() + 1, range.end() + 1),
            None => "-".to_string(),
        }
    }
}

/// Hands out export names unique within one run: the second record named
/// `X.pdf` gets `X_2.pdf`, the third `X_3.pdf`.
#[derive(Debug, Default)]
pub struct ExportNamer {
    seen: HashMap<String, usize>,
}

impl ExportNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next record, suffixed when the plain name was already used.
    pub fn assign(&mut self, record: &StructuredRecord) -> String {
        let name = record.export_name();
        let count = self.seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            name
        } else {
            with_suffix(&name, *count)
        }
    }
}

/// Unique export names for `records`, in order.
pub fn export_names(records: &[StructuredRecord]) -> Vec<String> {
    let mut namer = ExportNamer::new();
    records.iter().map(|r| namer.assign(r)).collect()
}

fn with_suffix(name: &str, n: usize) -> String {
    match name.strip_suffix(".pdf") {
        Some(stem) => format!("{}_{}.pdf", stem, n),
        None => format!("{}_{}", name, n),
    }
}

fn name_component(value: &str) -> String {
    let compact: String = value.trim().chars().filter(|c| *c != ' ').collect();
    if compact.is_empty() {
        NAME_PLACEHOLDER.to_string()
    } else {
        title_case(&compact)
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}
