//! Configuration structures for the split/match pipeline.

use serde::{Deserialize, Serialize};

use crate::error::CuError;

/// Main configuration for the cusplit pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CuConfig {
    /// Boundary detection and merge configuration.
    pub segmentation: SegmentationConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Roster matching configuration.
    pub matching: MatchingConfig,

    /// Roster loading configuration.
    pub roster: RosterConfig,

    /// Mail template configuration.
    pub mail: MailConfig,

    /// Split document export configuration.
    pub export: ExportConfig,
}

/// Boundary detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Recognise headers extracted with one space between letters.
    pub letter_spaced_headers: bool,

    /// Fall back to scanning lines when no header pattern matches a page.
    pub line_scan_fallback: bool,

    /// Lines joined by the line scan, counting the line with the header word.
    pub line_scan_window: usize,

    /// Merge adjacent segments that share a tax code.
    pub merge_same_tax_code: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            letter_spaced_headers: true,
            line_scan_fallback: true,
            line_scan_window: 4,
            merge_same_tax_code: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Reject tax codes whose check character does not verify.
    pub validate_tax_code: bool,

    /// Lines scanned around the tax code by the positional name fallback.
    pub positional_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_tax_code: false,
            positional_window: 4,
        }
    }
}

/// Roster matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum fuzzy score (0-100) accepted as a match.
    pub threshold: u8,

    /// Also compare names with whitespace removed (`DE LUCA` vs `DELUCA`).
    /// Off by default: the compact score depends on word order.
    pub compact_names: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 80,
            compact_names: false,
        }
    }
}

/// Roster loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Delimiter used when sniffing is inconclusive.
    pub fallback_delimiter: char,

    /// Number of leading lines inspected to sniff the delimiter.
    pub sniff_lines: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            fallback_delimiter: ';',
            sniff_lines: 20,
        }
    }
}

/// Mail template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Subject template (`{nome}`, `{cognome}`, `{anno}`).
    pub subject: String,

    /// HTML body template.
    pub body: String,

    /// Year used when a record has none; current year when unset.
    pub fallback_year: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            subject: crate::mailing::DEFAULT_SUBJECT.to_string(),
            body: crate::mailing::DEFAULT_BODY.to_string(),
            fallback_year: None,
        }
    }
}

/// Split document export configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Bundle split documents into a ZIP archive.
    pub zip: bool,
}

impl CuConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), CuError> {
        if self.matching.threshold > 100 {
            return Err(CuError::Config(format!(
                "matching.threshold must be between 0 and 100, got {}",
                self.matching.threshold
            )));
        }
        if self.segmentation.line_scan_window == 0 {
            return Err(CuError::Config(
                "segmentation.line_scan_window must be at least 1".to_string(),
            ));
        }
        if !matches!(self.roster.fallback_delimiter, ',' | ';' | '\t' | '|') {
            return Err(CuError::Config(format!(
                "roster.fallback_delimiter must be one of , ; | or tab, got {:?}",
                self.roster.fallback_delimiter
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CuConfig::default();
        assert_eq!(config.matching.threshold, 80);
        assert!(config.segmentation.merge_same_tax_code);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CuConfig = serde_json::from_str(r#"{"matching": {"threshold": 90}}"#).unwrap();
        assert_eq!(config.matching.threshold, 90);
        assert!(!config.matching.compact_names);
        assert_eq!(config.segmentation.line_scan_window, 4);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = CuConfig::default();
        config.matching.threshold = 101;
        assert!(config.validate().is_err());

        let mut config = CuConfig::default();
        config.roster.fallback_delimiter = 'x';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = CuConfig::default();
        config.mail.fallback_year = Some("2024".into());
        config.matching.compact_names = true;
        config.save(&path).unwrap();

        let loaded = CuConfig::from_file(&path).unwrap();
        assert_eq!(loaded.mail.fallback_year.as_deref(), Some("2024"));
        assert!(loaded.matching.compact_names);
    }
}
