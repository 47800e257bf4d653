//! Common regex patterns for CU extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Record header: "CERTIFICAZIONE UNICA 2025" on one line
    pub static ref CU_HEADER: Regex = Regex::new(
        r"(?i)CERTIFICAZIONE[ \t]+UNICA[ \t]+(\d{4})\b"
    ).unwrap();

    // Same header with line breaks anywhere between the words and the year
    pub static ref CU_HEADER_MULTILINE: Regex = Regex::new(
        r"(?i)CERTIFICAZIONE\s+UNICA\s+(\d{4})\b"
    ).unwrap();

    // Per-letter spacing artifact: "C E R T I F I C A Z I O N E  U N I C A  2 0 2 5"
    pub static ref CU_HEADER_SPACED: Regex = Regex::new(
        r"(?i)C\s*E\s*R\s*T\s*I\s*F\s*I\s*C\s*A\s*Z\s*I\s*O\s*N\s*E\s*U\s*N\s*I\s*C\s*A\s*(\d\s*\d\s*\d\s*\d)\b"
    ).unwrap();

    // Remainder of a header fragmented across lines, searched in a joined window
    pub static ref CU_HEADER_TAIL: Regex = Regex::new(
        r"(?i)\bUNICA\b\D{0,40}?\b(\d{4})\b"
    ).unwrap();

    // Italian tax code: 6 letters, 2 digits, letter, 2 digits, letter, 3 digits, letter
    pub static ref TAX_CODE: Regex = Regex::new(
        r"\b([A-Z]{6}\d{2}[A-Z]\d{2}[A-Z]\d{3}[A-Z])\b"
    ).unwrap();

    // Recipient data section headers, highest priority first
    pub static ref RECIPIENT_SECTIONS: Vec<Regex> = vec![
        Regex::new(r"(?i)DATI\s+RELATIVI\s+AL\s+DIPENDENTE").unwrap(),
        Regex::new(r"(?i)DATI\s+ANAGRAFICI\s+DEL\s+PERCIPIENTE").unwrap(),
        Regex::new(r"(?i)DATI\s+RELATIVI\s+AL\s+PERCIPIENTE").unwrap(),
        Regex::new(r"(?i)DATI\s+ANAGRAFICI").unwrap(),
    ];

    // Labeled surname: "Cognome o Denominazione ROSSI"
    pub static ref SURNAME_LABEL: Regex = Regex::new(
        r"(?i)\bCognome(?:\s+o\s+Denominazione)?\s*[:\s]*([A-Z\s'À-Ú\-]+)"
    ).unwrap();

    // Labeled given name; matches preceded by "Cognome" are filtered by the caller
    pub static ref GIVEN_NAME_LABEL: Regex = Regex::new(
        r"(?i)\bNome\b\s*[:\s]*([A-Z\s'À-Ú\-]+)"
    ).unwrap();

    // A line that can only be a name: upper-case letters, spaces, apostrophes, hyphens
    pub static ref NAME_LINE: Regex = Regex::new(
        r"^[\p{Lu}\s'\-]+$"
    ).unwrap();

    // Digit-initiated trailing junk after a captured name
    pub static ref DIGIT_SUFFIX: Regex = Regex::new(
        r"\d.*$"
    ).unwrap();
}

/// Field-label words that are never accepted as a name.
pub const LABEL_WORDS: &[&str] = &[
    "COGNOME",
    "NOME",
    "DENOMINAZIONE",
    "CODICE",
    "FISCALE",
    "NATO",
    "NATA",
    "NATO/A",
    "DATA",
    "NASCITA",
    "LUOGO",
    "SESSO",
    "COMUNE",
    "PROVINCIA",
    "DATI",
    "ANAGRAFICI",
    "DOMICILIO",
    "INDIRIZZO",
    "PERCIPIENTE",
    "DIPENDENTE",
];

/// Whether an upper-cased, whitespace-collapsed value is a field label.
pub fn is_label(value: &str) -> bool {
    let first = value.split_whitespace().next().unwrap_or("");
    LABEL_WORDS.contains(&value) || LABEL_WORDS.contains(&first)
}
