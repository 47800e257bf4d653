//! PDF processing module.

mod export;
mod extractor;

pub use export::{ExportedFile, PdfExporter, bundle_zip, zip_name};
pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::models::record::PageText;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-based).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract the text of every page, in order.
    fn extract_pages(&self) -> Result<PageText>;
}
