//! Error types for the cusplit-core library.

use thiserror::Error;

/// Main error type for the cusplit library.
#[derive(Error, Debug)]
pub enum CuError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Roster decoding error.
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// Page range outside the document or reversed.
    #[error("invalid page range {start}-{end} for a document of {page_count} pages")]
    InvalidRange {
        start: i32,
        end: i32,
        page_count: u32,
    },

    /// Failed to write a split document or archive.
    #[error("failed to export: {0}")]
    Export(String),
}

/// Errors related to roster decoding.
#[derive(Error, Debug)]
pub enum RosterError {
    /// The bytes could not be decoded as text.
    #[error("failed to decode roster: {0}")]
    Decode(String),

    /// Malformed CSV content.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or has no worksheet.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// File type is neither CSV nor a known spreadsheet.
    #[error("unsupported roster format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for the cusplit library.
pub type Result<T> = std::result::Result<T, CuError>;
