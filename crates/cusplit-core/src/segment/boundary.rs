//! Record boundary detection over per-page text.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::rules::patterns::{CU_HEADER, CU_HEADER_MULTILINE, CU_HEADER_SPACED, CU_HEADER_TAIL};
use crate::models::config::SegmentationConfig;
use crate::models::record::RecordBoundary;

/// First word of the record header, used by the line scan.
const HEADER_WORD: &str = "CERTIFICAZIONE";

/// Ways of recognising a record header on a page, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderStrategy {
    /// Phrase and year on one line.
    SameLine,
    /// Phrase and year separated by line breaks.
    MultiLine,
    /// One space between every letter.
    LetterSpaced,
    /// Header word on one line, the rest within the next few lines.
    LineScan,
}

impl HeaderStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            HeaderStrategy::SameLine => "same-line",
            HeaderStrategy::MultiLine => "multi-line",
            HeaderStrategy::LetterSpaced => "letter-spaced",
            HeaderStrategy::LineScan => "line-scan",
        }
    }

    /// Year of the header if this strategy recognises one in `text`.
    fn apply(&self, text: &str, window: usize) -> Option<String> {
        match self {
            HeaderStrategy::SameLine => CU_HEADER.captures(text).map(|c| c[1].to_string()),
            HeaderStrategy::MultiLine => {
                CU_HEADER_MULTILINE.captures(text).map(|c| c[1].to_string())
            }
            HeaderStrategy::LetterSpaced => CU_HEADER_SPACED
                .captures(text)
                .map(|c| c[1].chars().filter(char::is_ascii_digit).collect()),
            HeaderStrategy::LineScan => line_scan(text, window),
        }
    }
}

/// Find a line holding the header word, then look for the rest of the
/// phrase and the year in that line and the following ones.
fn line_scan(text: &str, window: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        let Some(pos) = upper.find(HEADER_WORD) else {
            continue;
        };

        let end = (idx + window.max(1)).min(lines.len());
        let mut joined = upper[pos + HEADER_WORD.len()..].to_string();
        for next in &lines[idx + 1..end] {
            joined.push(' ');
            joined.push_str(next.trim());
        }

        if let Some(caps) = CU_HEADER_TAIL.captures(&joined) {
            return Some(caps[1].to_string());
        }
    }
    None
}

/// Detects pages that start a new record.
pub struct BoundaryDetector {
    strategies: Vec<HeaderStrategy>,
    line_scan_window: usize,
}

impl BoundaryDetector {
    /// Create a detector with every strategy enabled.
    pub fn new() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }

    /// Create a detector honouring the segmentation configuration.
    pub fn from_config(config: &SegmentationConfig) -> Self {
        let mut strategies = vec![HeaderStrategy::SameLine, HeaderStrategy::MultiLine];
        if config.letter_spaced_headers {
            strategies.push(HeaderStrategy::LetterSpaced);
        }
        if config.line_scan_fallback {
            strategies.push(HeaderStrategy::LineScan);
        }
        Self {
            strategies,
            line_scan_window: config.line_scan_window,
        }
    }

    /// Strategies in the order they are tried.
    pub fn strategies(&self) -> &[HeaderStrategy] {
        &self.strategies
    }

    /// Recognise a header on a single page.
    pub fn detect_page(&self, text: &str) -> Option<(String, HeaderStrategy)> {
        for strategy in &self.strategies {
            trace!("Trying header strategy {}", strategy.name());
            if let Some(year) = strategy.apply(text, self.line_scan_window) {
                return Some((year, *strategy));
            }
        }
        None
    }

    /// Scan pages in order; each page contributes at most one boundary.
    pub fn detect<S: AsRef<str>>(&self, pages: &[S]) -> Vec<RecordBoundary> {
        let mut boundaries: Vec<RecordBoundary> = Vec::new();

        for (page, text) in pages.iter().enumerate() {
            if let Some((year, strategy)) = self.detect_page(text.as_ref()) {
                debug!("Record header {} on page {} ({})", year, page, strategy.name());
                boundaries.push(RecordBoundary {
                    page,
                    year,
                    strategy,
                });
            }
        }

        boundaries
    }
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_same_line_header() {
        let detector = BoundaryDetector::new();
        assert_eq!(
            detector.detect_page("Intestazione\nCERTIFICAZIONE UNICA 2025\nQuadro"),
            Some(("2025".to_string(), HeaderStrategy::SameLine))
        );
    }

    #[test]
    fn test_multi_line_header() {
        let detector = BoundaryDetector::new();
        assert_eq!(
            detector.detect_page("Certificazione\nUnica\n2024\n"),
            Some(("2024".to_string(), HeaderStrategy::MultiLine))
        );
    }

    #[test]
    fn test_letter_spaced_header() {
        let detector = BoundaryDetector::new();
        assert_eq!(
            detector.detect_page("C E R T I F I C A Z I O N E   U N I C A   2 0 2 5"),
            Some(("2025".to_string(), HeaderStrategy::LetterSpaced))
        );
    }

    #[test]
    fn test_line_scan_fragmented_header() {
        let detector = BoundaryDetector::new();
        let text = "Codice fiscale\nCERTIFICAZIONE\nredditi\nUNICA - anno\n2025\nDati";
        assert_eq!(
            detector.detect_page(text),
            Some(("2025".to_string(), HeaderStrategy::LineScan))
        );
    }

    #[test]
    fn test_line_scan_window_is_bounded() {
        let detector = BoundaryDetector::new();
        let text = "CERTIFICAZIONE\na\nb\nc\nUNICA 2025";
        assert_eq!(detector.detect_page(text), None);
    }

    #[test]
    fn test_disabled_strategies() {
        let config = SegmentationConfig {
            letter_spaced_headers: false,
            line_scan_fallback: false,
            ..SegmentationConfig::default()
        };
        let detector = BoundaryDetector::from_config(&config);
        assert_eq!(detector.strategies().len(), 2);
        assert_eq!(detector.detect_page("C E R T I F I C A Z I O N E U N I C A 2 0 2 5"), None);
    }

    #[test]
    fn test_header_below_field_labels_is_accepted() {
        let filler = "Cognome Nome Codice fiscale\n".repeat(30);
        let text = format!("{}CERTIFICAZIONE UNICA 2025", filler);
        assert!(BoundaryDetector::new().detect_page(&text).is_some());
    }

    #[test]
    fn test_detect_pages_in_order() {
        let detector = BoundaryDetector::new();
        let boundaries = detector.detect(&pages(&[
            "CERTIFICAZIONE UNICA 2025",
            "quadro 2",
            "CERTIFICAZIONE UNICA 2025 CERTIFICAZIONE UNICA 2024",
            "",
            "CERTIFICAZIONE\nUNICA 2025",
        ]));
        let found: Vec<(usize, &str)> =
            boundaries.iter().map(|b| (b.page, b.year.as_str())).collect();
        assert_eq!(found, vec![(0, "2025"), (2, "2025"), (4, "2025")]);
        assert!(boundaries.windows(2).all(|w| w[0].page < w[1].page));
    }

    #[test]
    fn test_no_boundaries() {
        let detector = BoundaryDetector::new();
        assert!(detector.detect(&pages(&["nulla", "da vedere"])).is_empty());
        assert!(detector.detect::<String>(&[]).is_empty());
    }
}
