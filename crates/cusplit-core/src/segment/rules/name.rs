//! Recipient surname and given name extraction.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::ExtractionMatch;
use super::patterns::{
    DIGIT_SUFFIX, GIVEN_NAME_LABEL, NAME_LINE, RECIPIENT_SECTIONS, SURNAME_LABEL, is_label,
};

/// Surname and given name of a recipient, upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub surname: String,
    pub given_name: String,
}

impl PersonName {
    fn new(surname: &str, given_name: &str) -> Self {
        Self {
            surname: collapse(surname),
            given_name: collapse(given_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.surname.is_empty() && self.given_name.is_empty()
    }
}

/// Ways of locating the recipient's name, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameStrategy {
    /// "Cognome" / "Nome" labeled fields in the recipient section.
    Labeled,
    /// Name-only lines next to the recipient's tax code.
    Positional,
}

impl NameStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            NameStrategy::Labeled => "labeled",
            NameStrategy::Positional => "positional",
        }
    }
}

/// Name field extractor.
pub struct NameExtractor {
    window: usize,
}

impl NameExtractor {
    /// Create a name extractor scanning 4 lines around the tax code.
    pub fn new() -> Self {
        Self { window: 4 }
    }

    /// Set the number of lines scanned on each side of the tax code.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Extract the recipient's name, using `tax_code` to anchor the fallback.
    pub fn extract(&self, text: &str, tax_code: &str) -> Option<ExtractionMatch<PersonName>> {
        let labeled = labeled_name(recipient_region(text));
        if !labeled.is_empty() {
            trace!("Name {:?} found by labeled fields", labeled);
            return Some(ExtractionMatch::new(labeled, 0.9, NameStrategy::Labeled.name()));
        }

        let tax_code = tax_code.trim();
        if tax_code.is_empty() {
            return None;
        }

        let positional = self.positional_name(text, tax_code)?;
        trace!("Name {:?} found next to tax code {}", positional, tax_code);
        Some(ExtractionMatch::new(positional, 0.6, NameStrategy::Positional.name()))
    }

    fn positional_name(&self, text: &str, tax_code: &str) -> Option<PersonName> {
        let lines: Vec<&str> = text.lines().collect();

        for (idx, _) in lines.iter().enumerate().filter(|(_, l)| l.contains(tax_code)) {
            let after_end = (idx + 1 + self.window).min(lines.len());
            let after: Vec<&str> = lines[idx + 1..after_end]
                .iter()
                .map(|l| l.trim())
                .filter(|l| is_name_line(l))
                .collect();
            if let Some(name) = name_from_following(&after) {
                return Some(name);
            }

            let before_start = idx.saturating_sub(self.window);
            let before: Vec<&str> = lines[before_start..idx]
                .iter()
                .map(|l| l.trim())
                .filter(|l| is_name_line(l))
                .collect();
            if let Some(name) = name_from_preceding(&before) {
                return Some(name);
            }
        }
        None
    }
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `(surname, given_name)`; both empty when nothing is found.
pub fn extract_name(text: &str, tax_code: &str) -> (String, String) {
    NameExtractor::new()
        .extract(text, tax_code)
        .map(|m| (m.value.surname, m.value.given_name))
        .unwrap_or_default()
}

/// Text after the first recipient header found, by header priority.
fn recipient_region(text: &str) -> &str {
    RECIPIENT_SECTIONS
        .iter()
        .find_map(|section| section.find(text))
        .map(|header| &text[header.end()..])
        .unwrap_or(text)
}

fn labeled_name(region: &str) -> PersonName {
    let surname = SURNAME_LABEL
        .captures(region)
        .map(|caps| clean_value(&caps[1]))
        .unwrap_or_default();

    let given_name = GIVEN_NAME_LABEL
        .captures_iter(region)
        .find(|caps| {
            caps.get(0)
                .is_some_and(|m| !preceded_by_surname_label(&region[..m.start()]))
        })
        .map(|caps| clean_value(&caps[1]))
        .unwrap_or_default();

    PersonName::new(&surname, &given_name)
}

fn preceded_by_surname_label(before: &str) -> bool {
    let trimmed = before.trim_end_matches(|c: char| c.is_whitespace() || c == '/' || c == ':');
    trimmed.to_lowercase().ends_with("cognome")
}

/// First line of a captured value, digit suffix removed, labels rejected.
fn clean_value(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("");
    let value = collapse(&DIGIT_SUFFIX.replace(first_line, ""));
    if value.is_empty() || is_label(&value) {
        return String::new();
    }
    value
}

fn is_name_line(line: &str) -> bool {
    line.chars().count() > 2 && NAME_LINE.is_match(line) && !is_label(&collapse(line))
}

fn name_from_following(lines: &[&str]) -> Option<PersonName> {
    let first = lines.first()?;
    if let Some(name) = split_full_name(first) {
        return Some(name);
    }
    Some(PersonName::new(first, lines.get(1).copied().unwrap_or("")))
}

fn name_from_preceding(lines: &[&str]) -> Option<PersonName> {
    let last = lines.last()?;
    if let Some(name) = split_full_name(last) {
        return Some(name);
    }
    match lines.len() {
        1 => Some(PersonName::new(last, "")),
        n => Some(PersonName::new(lines[n - 2], last)),
    }
}

/// "ROSSI MARIO" -> surname ROSSI, given name MARIO.
fn split_full_name(line: &str) -> Option<PersonName> {
    let mut tokens = line.split_whitespace();
    let surname = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }
    Some(PersonName::new(surname, &rest.join(" ")))
}

fn collapse(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_fields() {
        let text = "DATI RELATIVI AL DIPENDENTE\n\
                    Codice fiscale RSSMRA80A01H501U\n\
                    Cognome o Denominazione ROSSI\n\
                    Nome MARIO\n\
                    Sesso M";
        assert_eq!(extract_name(text, ""), ("ROSSI".to_string(), "MARIO".to_string()));
    }

    #[test]
    fn test_labeled_values_on_next_line() {
        let text = "DATI ANAGRAFICI DEL PERCIPIENTE\nCognome o Denominazione\nde luca\nNome:\nMaria  Grazia\n";
        assert_eq!(
            extract_name(text, ""),
            ("DE LUCA".to_string(), "MARIA GRAZIA".to_string())
        );
    }

    #[test]
    fn test_searches_after_recipient_header() {
        let text = "DATI RELATIVI AL SOSTITUTO\nCognome o Denominazione ACME\nNome SRL\n\
                    DATI RELATIVI AL DIPENDENTE\nCognome o Denominazione BIANCHI\nNome LAURA\n";
        assert_eq!(extract_name(text, ""), ("BIANCHI".to_string(), "LAURA".to_string()));
    }

    #[test]
    fn test_digit_suffix_stripped() {
        let text = "Cognome o Denominazione VERDI\nNome GIUSEPPE\n";
        let (surname, given) = extract_name(text, "");
        assert_eq!(surname, "VERDI");
        assert_eq!(given, "GIUSEPPE");

        assert_eq!(clean_value("NERI 12 03 1980"), "NERI");
    }

    #[test]
    fn test_given_name_skips_surname_label() {
        let text = "Cognome Nome\nROSSI MARIO\nNome LUCA";
        let (_, given) = extract_name(text, "");
        assert_eq!(given, "LUCA");
    }

    #[test]
    fn test_label_values_discarded() {
        let text = "Cognome o Denominazione\nNome\nSesso\nNome\nCodice fiscale\n";
        assert_eq!(extract_name(text, ""), (String::new(), String::new()));
    }

    #[test]
    fn test_positional_after_tax_code() {
        let text = "01234567890\nRSSMRA80A01H501U\nROSSI\nMARIO\nROMA\n";
        assert_eq!(
            extract_name(text, "RSSMRA80A01H501U"),
            ("ROSSI".to_string(), "MARIO".to_string())
        );
    }

    #[test]
    fn test_positional_two_token_line() {
        let text = "RSSMRA80A01H501U\n12/01/1980\nROSSI MARIO\nROMA\n";
        let found = NameExtractor::new().extract(text, "RSSMRA80A01H501U").unwrap();
        assert_eq!(found.value, PersonName::new("ROSSI", "MARIO"));
        assert_eq!(found.strategy, "positional");
    }

    #[test]
    fn test_positional_before_tax_code() {
        let text = "Modello 2025\nD'AMICO\nANNA\nDMCNNA85M41F205X\n01/01/1985\n";
        assert_eq!(
            extract_name(text, "DMCNNA85M41F205X"),
            ("D'AMICO".to_string(), "ANNA".to_string())
        );
    }

    #[test]
    fn test_positional_skips_labels() {
        let text = "RSSMRA80A01H501U\nCODICE FISCALE\nSESSO\nBIANCHI\nLAURA\n";
        assert_eq!(
            extract_name(text, "RSSMRA80A01H501U"),
            ("BIANCHI".to_string(), "LAURA".to_string())
        );
    }

    #[test]
    fn test_positional_needs_tax_code() {
        let text = "ROSSI\nMARIO\n";
        assert_eq!(extract_name(text, ""), (String::new(), String::new()));
        assert_eq!(extract_name(text, "RSSMRA80A01H501U"), (String::new(), String::new()));
    }

    #[test]
    fn test_window_limits_scan() {
        let text = "RSSMRA80A01H501U\n1\n2\n3\n4\nROSSI\nMARIO\n";
        assert!(NameExtractor::new().extract(text, "RSSMRA80A01H501U").is_none());
        assert!(
            NameExtractor::new()
                .with_window(6)
                .extract(text, "RSSMRA80A01H501U")
                .is_some()
        );
    }
}
