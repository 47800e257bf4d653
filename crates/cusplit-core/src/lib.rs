//! Core library for splitting Certificazione Unica (CU) batches.
//!
//! This crate provides:
//! - PDF processing (per-page text extraction, page-range export, ZIP bundles)
//! - Record segmentation with layered header and field heuristics
//! - Roster loading from CSV and spreadsheet files
//! - Record-to-roster matching by tax code and fuzzy name
//! - Message rendering for matched records

pub mod error;
pub mod mailing;
pub mod matching;
pub mod models;
pub mod pdf;
pub mod roster;
pub mod segment;

pub use error::{CuError, PdfError, Result, RosterError};
pub use mailing::{Delivery, DeliveryManifest, MailTemplate, prepare_deliveries};
pub use matching::MatchingEngine;
pub use models::{
    CuConfig, MatchMethod, MatchReport, MatchResult, MatchStatus, PageText, RecordBoundary,
    RosterEntry, StructuredRecord,
};
pub use pdf::{PdfExporter, PdfExtractor, PdfProcessor};
pub use roster::{RosterFormat, RosterLoader};
pub use segment::{DocumentSegmenter, RecordSegmenter, SegmentationResult};
