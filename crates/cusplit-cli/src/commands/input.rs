//! Configuration and document loading shared by the commands.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use cusplit_core::models::config::CuConfig;
use cusplit_core::models::record::PageText;
use cusplit_core::pdf::{PdfExporter, PdfExtractor, PdfProcessor};

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cusplit")
        .join("config.json")
}

/// Load the configuration from `--config`, else the default file when it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CuConfig> {
    let config = match config_path {
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            CuConfig::from_file(path)?
        }
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!("Using config file {}", default_path.display());
                CuConfig::from_file(&default_path)?
            } else {
                CuConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// A document ready for segmentation.
pub struct LoadedInput {
    /// Text of every page.
    pub pages: PageText,
    /// Page-range exporter; `None` for plain-text dumps.
    pub exporter: Option<PdfExporter>,
}

/// Whether the file extension is one the commands accept as a document.
pub fn is_supported_input(path: &Path) -> bool {
    matches!(extension(path).as_str(), "pdf" | "txt")
}

/// Read a PDF, or a form-feed separated text dump (`pdftotext` output).
pub fn load_input(path: &Path) -> anyhow::Result<LoadedInput> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let ext = extension(path);
    info!("Loading {}", path.display());

    match ext.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let extractor = PdfExtractor::from_bytes(&data)?;
            let pages = extractor.extract_pages()?;
            let exporter = PdfExporter::from_document(extractor.document()?.clone());
            Ok(LoadedInput {
                pages,
                exporter: Some(exporter),
            })
        }
        "txt" => {
            let text = fs::read_to_string(path)?;
            Ok(LoadedInput {
                pages: PageText::from_form_feed(&text),
                exporter: None,
            })
        }
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
