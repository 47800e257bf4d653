//! Page-range export of records into standalone PDFs and ZIP bundles.

use std::io::{Cursor, Write};

use lopdf::Document;
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::Result;
use crate::error::PdfError;
use crate::models::record::{ExportNamer, StructuredRecord};

/// A split document ready to be written or attached.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// File name, unique within one export run.
    pub name: String,
    /// PDF bytes.
    pub data: Vec<u8>,
    /// Record index the file was cut from.
    pub record_index: i32,
}

/// Cuts page ranges out of a loaded document.
pub struct PdfExporter {
    document: Document,
    page_count: u32,
}

impl PdfExporter {
    /// Exporter over an already loaded (and decrypted) document.
    pub fn from_document(document: Document) -> Self {
        let page_count = document.get_pages().len() as u32;
        Self {
            document,
            page_count,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Write pages `start..=end` (0-based) to a new PDF.
    pub fn export_range(&self, start: i32, end: i32) -> Result<Vec<u8>> {
        if start < 0 || end < start || end as u32 >= self.page_count {
            return Err(PdfError::InvalidRange {
                start,
                end,
                page_count: self.page_count,
            });
        }

        let keep = (start as u32 + 1)..=(end as u32 + 1);
        let drop: Vec<u32> = (1..=self.page_count).filter(|p| !keep.contains(p)).collect();

        let mut doc = self.document.clone();
        doc.delete_pages(&drop);
        doc.prune_objects();

        let mut data = Vec::new();
        doc.save_to(&mut data)
            .map_err(|e| PdfError::Export(e.to_string()))?;

        debug!("Exported pages {}-{} ({} bytes)", start + 1, end + 1, data.len());
        Ok(data)
    }

    /// Export one record under its `export_name`.
    pub fn export_record(&self, record: &StructuredRecord) -> Result<ExportedFile> {
        Ok(ExportedFile {
            name: record.export_name(),
            data: self.export_range(record.start_page, record.end_page)?,
            record_index: record.index,
        })
    }

    /// Export every real record; colliding names get a numeric suffix.
    pub fn export_all(&self, records: &[StructuredRecord]) -> Result<Vec<ExportedFile>> {
        let mut namer = ExportNamer::new();
        let mut files = Vec::with_capacity(records.len());

        for record in records.iter().filter(|r| !r.is_placeholder()) {
            let mut file = self.export_record(record)?;
            file.name = namer.assign(record);
            files.push(file);
        }

        info!("Exported {} documents", files.len());
        Ok(files)
    }
}

/// Archive name for a batch: `CU_<year>_tutte.zip`, year of the first record.
pub fn zip_name(records: &[StructuredRecord]) -> String {
    let year = records
        .iter()
        .find(|r| !r.year.is_empty())
        .map(|r| r.year.as_str())
        .unwrap_or("CU");
    format!("CU_{}_tutte.zip", year)
}

/// Bundle exported files into a deflated ZIP archive.
pub fn bundle_zip(files: &[ExportedFile]) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        writer
            .start_file(file.name.as_str(), options)
            .map_err(|e| PdfError::Export(e.to_string()))?;
        writer
            .write_all(&file.data)
            .map_err(|e| PdfError::Export(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| PdfError::Export(e.to_string()))?;
    Ok(cursor.into_inner())
}
