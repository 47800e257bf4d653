//! Document segmentation: boundaries, merge pass and field extraction.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::boundary::BoundaryDetector;
use super::rules::{FieldExtractor, FieldSource, NameExtractor, TaxCodeExtractor};
use crate::models::config::CuConfig;
use crate::models::record::{PageText, RecordBoundary, StructuredRecord};

/// Result of segmenting one document.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationResult {
    /// Records in page order, indexed from 1.
    pub records: Vec<StructuredRecord>,
    /// Boundaries found before merging.
    pub boundaries: Vec<RecordBoundary>,
    /// Number of pages in the document.
    pub page_count: usize,
    /// How each record's tax code and name were found, in record order.
    pub sources: Vec<RecordSources>,
    /// Segmentation warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extraction diagnostics of one record; `None` when the field was not found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSources {
    pub index: i32,
    pub tax_code: Option<FieldSource>,
    pub name: Option<FieldSource>,
}

/// Trait for record segmentation.
pub trait RecordSegmenter {
    /// Split the pages of one document into records.
    fn segment(&self, pages: &PageText) -> SegmentationResult;
}

/// A page range before names are extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub start_page: usize,
    pub end_page: usize,
    pub year: String,
    pub tax_code: String,
    pub tax_code_source: Option<FieldSource>,
    pub text: String,
}

/// Header-driven segmenter for CU batches.
pub struct DocumentSegmenter {
    detector: BoundaryDetector,
    tax_codes: TaxCodeExtractor,
    names: NameExtractor,
    merge: bool,
}

impl DocumentSegmenter {
    /// Create a segmenter with default settings.
    pub fn new() -> Self {
        Self::from_config(&CuConfig::default())
    }

    /// Create a segmenter from the segmentation and extraction configuration.
    pub fn from_config(config: &CuConfig) -> Self {
        Self {
            detector: BoundaryDetector::from_config(&config.segmentation),
            tax_codes: TaxCodeExtractor::new()
                .with_validation(config.extraction.validate_tax_code),
            names: NameExtractor::new().with_window(config.extraction.positional_window),
            merge: config.segmentation.merge_same_tax_code,
        }
    }

    /// Enable or disable merging of adjacent segments sharing a tax code.
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// One segment per boundary, each running up to the page before the next.
    pub fn raw_segments(&self, pages: &PageText, boundaries: &[RecordBoundary]) -> Vec<RawSegment> {
        let last_page = pages.len().saturating_sub(1);

        boundaries
            .iter()
            .enumerate()
            .map(|(i, boundary)| {
                let end_page = boundaries
                    .get(i + 1)
                    .map(|next| next.page.saturating_sub(1))
                    .unwrap_or(last_page)
                    .max(boundary.page);
                let text = pages.concat(boundary.page..=end_page);
                let found = self.tax_codes.extract(&text);
                let tax_code_source = found.as_ref().map(|m| m.source());

                RawSegment {
                    start_page: boundary.page,
                    end_page,
                    year: boundary.year.clone(),
                    tax_code: found.map(|m| m.value).unwrap_or_default(),
                    tax_code_source,
                    text,
                }
            })
            .collect()
    }

    fn finalize(
        &self,
        segments: Vec<RawSegment>,
        sources: &mut Vec<RecordSources>,
        warnings: &mut Vec<String>,
    ) -> Vec<StructuredRecord> {
        segments
            .into_iter()
            .enumerate()
            .map(|(i, segment)| {
                let index = i as i32 + 1;
                let found = self.names.extract(&segment.text, &segment.tax_code);
                sources.push(RecordSources {
                    index,
                    tax_code: segment.tax_code_source,
                    name: found.as_ref().map(|m| m.source()),
                });
                let name = found.map(|m| m.value).unwrap_or_default();

                let record = StructuredRecord {
                    index,
                    start_page: segment.start_page as i32,
                    end_page: segment.end_page as i32,
                    year: segment.year,
                    tax_code: segment.tax_code,
                    surname: name.surname,
                    given_name: name.given_name,
                    raw_text: segment.text,
                };

                if record.tax_code.is_empty() {
                    warnings.push(format!(
                        "Record {} (pages {}): tax code not found",
                        index,
                        record.pages_label()
                    ));
                }
                if record.surname.is_empty() && record.given_name.is_empty() {
                    warnings.push(format!(
                        "Record {} (pages {}): name not found",
                        index,
                        record.pages_label()
                    ));
                }

                debug!(
                    "Record {}: pages {}, tax code {:?}, name {:?} {:?}",
                    index,
                    record.pages_label(),
                    record.tax_code,
                    record.surname,
                    record.given_name
                );
                record
            })
            .collect()
    }
}

impl Default for DocumentSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSegmenter for DocumentSegmenter {
    fn segment(&self, pages: &PageText) -> SegmentationResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Segmenting {} pages", pages.len());

        let boundaries = self.detector.detect(pages.pages());
        if boundaries.is_empty() && !pages.is_empty() {
            warnings.push("No record header found".to_string());
        }

        let mut segments = self.raw_segments(pages, &boundaries);
        if self.merge {
            segments = merge_segments(segments);
        }

        let mut sources = Vec::new();
        let records = self.finalize(segments, &mut sources, &mut warnings);

        info!(
            "Found {} boundaries, {} records",
            boundaries.len(),
            records.len()
        );

        SegmentationResult {
            records,
            boundaries,
            page_count: pages.len(),
            sources,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Merge each segment into the preceding one when both carry the same
/// non-empty tax code. Only adjacent segments merge.
pub fn merge_segments(segments: Vec<RawSegment>) -> Vec<RawSegment> {
    let mut merged: Vec<RawSegment> = Vec::with_capacity(segments.len());

    for segment in segments {
        if let Some(previous) = merged.last_mut() {
            if !segment.tax_code.is_empty() && segment.tax_code == previous.tax_code {
                debug!(
                    "Merging pages {}-{} into segment starting at page {} ({})",
                    segment.start_page, segment.end_page, previous.start_page, segment.tax_code
                );
                previous.end_page = segment.end_page;
                previous.text.push_str(&segment.text);
                continue;
            }
        }
        merged.push(segment);
    }

    merged
}
