//! Per-page PDF text extraction using pdf-extract and lopdf.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;
use crate::models::record::PageText;

/// PDF text extractor.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    /// The loaded (decrypted) document.
    pub fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Fast path: pdf-extract's layout-aware text, split per page.
    fn extract_with_pdf_extract(&self) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed fonts
        let data = self.raw_data.as_slice();
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(data))
            .map_err(|_| PdfError::TextExtraction("pdf-extract panicked".to_string()))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Slow path: lopdf content stream text, page by page.
    fn extract_with_lopdf(&self) -> Result<Vec<String>> {
        let page_count = self.page_count();
        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            match self.extract_page_text(page) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    warn!("No text for page {}: {}", page, e);
                    pages.push(String::new());
                }
            }
        }
        Ok(pages)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_pages(&self) -> Result<PageText> {
        let page_count = self.page_count() as usize;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let pages = match self.extract_with_pdf_extract() {
            Ok(pages) if pages.len() == page_count => pages,
            Ok(pages) => {
                warn!(
                    "pdf-extract returned {} pages for a {} page document, using lopdf",
                    pages.len(),
                    page_count
                );
                self.extract_with_lopdf()?
            }
            Err(e) => {
                warn!("pdf-extract failed ({}), using lopdf", e);
                self.extract_with_lopdf()?
            }
        };

        debug!(
            "Extracted {} characters from {} pages",
            pages.iter().map(String::len).sum::<usize>(),
            pages.len()
        );
        Ok(PageText::new(pages))
    }
}
