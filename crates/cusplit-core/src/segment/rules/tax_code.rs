//! Italian tax code (codice fiscale) extraction and validation.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::patterns::{RECIPIENT_SECTIONS, TAX_CODE};
use super::{ExtractionMatch, FieldExtractor};

/// Ways of locating the recipient's tax code, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxCodeStrategy {
    /// First tax code after a recipient data section header.
    RecipientSection,
    /// The only tax code in the text, or the second one (the first is the issuer's).
    Positional,
}

impl TaxCodeStrategy {
    /// Strategies in the order they are tried.
    pub const CHAIN: [TaxCodeStrategy; 2] =
        [TaxCodeStrategy::RecipientSection, TaxCodeStrategy::Positional];

    pub fn name(&self) -> &'static str {
        match self {
            TaxCodeStrategy::RecipientSection => "recipient-section",
            TaxCodeStrategy::Positional => "positional",
        }
    }
}

/// Tax code field extractor.
pub struct TaxCodeExtractor {
    validate: bool,
}

impl TaxCodeExtractor {
    /// Create a new tax code extractor without checksum validation.
    pub fn new() -> Self {
        Self { validate: false }
    }

    /// Set whether to reject tax codes with a wrong check character.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn accepts(&self, code: &str) -> bool {
        !self.validate || validate_tax_code(code)
    }

    fn apply(&self, strategy: TaxCodeStrategy, text: &str) -> Option<ExtractionMatch<String>> {
        match strategy {
            TaxCodeStrategy::RecipientSection => {
                for section in RECIPIENT_SECTIONS.iter() {
                    let Some(header) = section.find(text) else {
                        continue;
                    };
                    let offset = header.end();
                    let found = self
                        .extract_all(&text[offset..])
                        .into_iter()
                        .next()
                        .map(|m| {
                            let (start, end) = m.position.unwrap_or_default();
                            ExtractionMatch::new(m.value, 0.95, strategy.name())
                                .with_position(offset + start, offset + end)
                        });
                    if found.is_some() {
                        return found;
                    }
                }
                None
            }
            TaxCodeStrategy::Positional => {
                let mut all = self.extract_all(text);
                let (pick, confidence) = match all.len() {
                    0 => return None,
                    1 => (0, 0.8),
                    _ => (1, 0.7),
                };
                let m = all.swap_remove(pick);
                Some(ExtractionMatch {
                    confidence,
                    strategy: strategy.name(),
                    ..m
                })
            }
        }
    }
}

impl Default for TaxCodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxCodeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        for strategy in TaxCodeStrategy::CHAIN {
            if let Some(found) = self.apply(strategy, text) {
                trace!("Tax code {} found by {}", found.value, strategy.name());
                return Some(found);
            }
        }
        None
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TAX_CODE
            .find_iter(text)
            .filter(|m| self.accepts(m.as_str()))
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), 0.5, "grammar")
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

/// Extract the recipient's tax code from the text of one record.
pub fn extract_tax_code(text: &str) -> Option<String> {
    TaxCodeExtractor::new().extract(text).map(|m| m.value)
}

/// Validate the check character of an Italian tax code.
///
/// Characters at odd positions (1-based) are mapped through the odd table,
/// characters at even positions to their plain value; the sum modulo 26 gives
/// the expected check letter.
pub fn validate_tax_code(code: &str) -> bool {
    const ODD: [u32; 26] = [
        1, 0, 5, 7, 9, 13, 15, 17, 19, 21, 2, 4, 18, 20, 11, 3, 6, 8, 12, 14, 16, 10, 22, 25, 24,
        23,
    ];

    let chars: Vec<char> = code.trim().to_uppercase().chars().collect();
    if chars.len() != 16 || !chars.iter().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let mut sum = 0u32;
    for (i, c) in chars.iter().take(15).enumerate() {
        let value = match c {
            '0'..='9' => *c as u32 - '0' as u32,
            _ => *c as u32 - 'A' as u32,
        };
        sum += if i % 2 == 0 { ODD[value as usize] } else { value };
    }

    let expected = (b'A' + (sum % 26) as u8) as char;
    chars[15] == expected
}
