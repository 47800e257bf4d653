//! Roster entries loaded from the employee registry.

use serde::{Deserialize, Serialize};

use crate::matching::normalize;

/// One person known to the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Surname, upper case.
    pub surname: String,

    /// Given name, upper case.
    pub given_name: String,

    /// Tax code, upper case, may be empty.
    pub tax_code: String,

    /// Delivery address, may be empty.
    pub email: String,
}

impl RosterEntry {
    /// Build an entry, upper-casing names and tax code.
    pub fn new(surname: &str, given_name: &str, tax_code: &str, email: &str) -> Self {
        Self {
            surname: surname.trim().to_uppercase(),
            given_name: given_name.trim().to_uppercase(),
            tax_code: tax_code.trim().to_uppercase(),
            email: email.trim().to_string(),
        }
    }

    /// Whether the row carries nothing that could identify a person.
    pub fn is_blank(&self) -> bool {
        self.surname.is_empty() && self.given_name.is_empty() && self.tax_code.is_empty()
    }

    /// Accent-stripped `SURNAME GIVEN_NAME` used for fuzzy comparison.
    pub fn normalized_full_name(&self) -> String {
        normalize(&format!("{} {}", self.surname, self.given_name))
    }
}
