//! Classified results of reconciling records against the roster.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::StructuredRecord;
use super::roster::RosterEntry;

/// Outcome of matching one record or roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Record paired with a roster entry.
    Matched,
    /// Record with no roster entry above threshold.
    RecordUnmatched,
    /// Roster entry never claimed by any record.
    RosterUnmatched,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Matched => "matched",
            MatchStatus::RecordUnmatched => "record_unmatched",
            MatchStatus::RosterUnmatched => "roster_unmatched",
        };
        f.write_str(label)
    }
}

/// Strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethod {
    /// Exact tax code lookup.
    #[serde(rename = "tax code")]
    TaxCode,
    /// Name similarity above threshold.
    #[serde(rename = "name (fuzzy)")]
    FuzzyName,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::TaxCode => f.write_str("tax code"),
            MatchMethod::FuzzyName => f.write_str("name (fuzzy)"),
        }
    }
}

/// One row of the match report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The record, or a placeholder for an unclaimed roster entry.
    pub record: StructuredRecord,

    /// Position of the referenced entry in the roster slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_index: Option<usize>,

    /// Classification.
    pub status: MatchStatus,

    /// Delivery address, editable by the caller after matching.
    pub email: String,

    /// Similarity score (0-100).
    pub score: u8,

    /// Strategy that produced the match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
}

impl MatchResult {
    /// Resolve the referenced roster entry.
    pub fn entry<'a>(&self, roster: &'a [RosterEntry]) -> Option<&'a RosterEntry> {
        self.roster_index.and_then(|i| roster.get(i))
    }

    /// Whether a message can be sent for this result.
    pub fn is_deliverable(&self) -> bool {
        self.status != MatchStatus::RosterUnmatched
            && !self.email.trim().is_empty()
            && !self.record.is_placeholder()
    }
}

/// Full result set of one matching run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    /// Record results in record order, then unclaimed roster entries.
    pub results: Vec<MatchResult>,

    /// Threshold the run used.
    pub threshold: u8,
}

impl MatchReport {
    /// Results with the given status.
    pub fn with_status(&self, status: MatchStatus) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    /// Number of results with the given status.
    pub fn count(&self, status: MatchStatus) -> usize {
        self.with_status(status).count()
    }

    /// Results a message can be sent for.
    pub fn deliverable(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| r.is_deliverable())
    }

    /// Override the email of a result, as a user would after review.
    pub fn set_email(&mut self, position: usize, email: &str) -> bool {
        match self.results.get_mut(position) {
            Some(result) => {
                result.email = email.trim().to_string();
                true
            }
            None => false,
        }
    }
}
