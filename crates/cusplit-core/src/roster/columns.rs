//! Header-to-field mapping for roster tables.

use serde::Serialize;

/// Tax code column names accepted verbatim.
const TAX_CODE_COLUMNS: &[&str] = &["cf", "codice_fiscale", "codicefiscale", "cod_fiscale"];

/// Roster field a column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterField {
    Surname,
    GivenName,
    TaxCode,
    Email,
}

impl RosterField {
    /// Classify a normalized column name.
    pub fn classify(column: &str) -> Option<Self> {
        if column.contains("cognome") || column.contains("denominazione") {
            Some(RosterField::Surname)
        } else if column.contains("nome") {
            Some(RosterField::GivenName)
        } else if TAX_CODE_COLUMNS.contains(&column) || column.contains("fiscale") {
            Some(RosterField::TaxCode)
        } else if column.contains("mail") {
            Some(RosterField::Email)
        } else {
            None
        }
    }
}

/// `" Codice Fiscale "` -> `"codice_fiscale"`.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Column positions for each roster field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub surname: Option<usize>,
    pub given_name: Option<usize>,
    pub tax_code: Option<usize>,
    pub email: Option<usize>,
    /// Columns that feed no field.
    pub unmapped: Vec<String>,
}

impl ColumnMap {
    /// Map raw header cells; when several columns feed one field the last wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut map = ColumnMap::default();
        for (position, header) in headers.iter().enumerate() {
            let column = normalize_column(header.as_ref());
            match RosterField::classify(&column) {
                Some(RosterField::Surname) => map.surname = Some(position),
                Some(RosterField::GivenName) => map.given_name = Some(position),
                Some(RosterField::TaxCode) => map.tax_code = Some(position),
                Some(RosterField::Email) => map.email = Some(position),
                None => map.unmapped.push(column),
            }
        }
        map
    }

    /// Whether at least one identifying column was found.
    pub fn is_usable(&self) -> bool {
        self.surname.is_some() || self.given_name.is_some() || self.tax_code.is_some()
    }
}
