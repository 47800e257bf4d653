//! Reconciliation of structured records against a roster.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::similarity::{name_similarity, normalize};
use crate::models::config::MatchingConfig;
use crate::models::matching::{MatchMethod, MatchReport, MatchResult, MatchStatus};
use crate::models::record::StructuredRecord;
use crate::models::roster::RosterEntry;

/// Roster positions already paired with a record during one run.
#[derive(Debug, Default)]
struct ClaimSet {
    claimed: HashSet<usize>,
}

impl ClaimSet {
    fn is_claimed(&self, position: usize) -> bool {
        self.claimed.contains(&position)
    }

    fn claim(&mut self, position: usize) {
        self.claimed.insert(position);
    }
}

/// A roster position with its score and the strategy that chose it.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: usize,
    score: u8,
    method: MatchMethod,
}

/// Matching engine pairing records with roster entries.
pub struct MatchingEngine {
    threshold: u8,
    compact_names: bool,
}

impl MatchingEngine {
    /// Create an engine with the default threshold of 80.
    pub fn new() -> Self {
        Self::from_config(&MatchingConfig::default())
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.threshold.min(100),
            compact_names: config.compact_names,
        }
    }

    /// Set the minimum fuzzy score accepted as a match.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold.min(100);
        self
    }

    /// Set whether names are also compared with whitespace removed.
    pub fn with_compact_names(mut self, compact: bool) -> Self {
        self.compact_names = compact;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Match every record, then report every roster entry left unclaimed.
    pub fn run(&self, records: &[StructuredRecord], roster: &[RosterEntry]) -> MatchReport {
        let by_tax_code = tax_code_index(roster);
        let names: Vec<String> = roster.iter().map(RosterEntry::normalized_full_name).collect();
        let mut claims = ClaimSet::default();
        let mut results = Vec::with_capacity(records.len() + roster.len());

        for record in records {
            let candidate = self
                .exact(record, &by_tax_code, &claims)
                .or_else(|| self.fuzzy(record, &names, &claims));

            let result = match candidate {
                Some(found) => {
                    claims.claim(found.position);
                    debug!(
                        "Record {} matched roster row {} by {} ({})",
                        record.index, found.position, found.method, found.score
                    );
                    MatchResult {
                        record: record.clone(),
                        roster_index: Some(found.position),
                        status: MatchStatus::Matched,
                        email: roster[found.position].email.clone(),
                        score: found.score,
                        method: Some(found.method),
                    }
                }
                None => {
                    debug!("Record {} unmatched", record.index);
                    MatchResult {
                        record: record.clone(),
                        roster_index: None,
                        status: MatchStatus::RecordUnmatched,
                        email: String::new(),
                        score: 0,
                        method: None,
                    }
                }
            };
            results.push(result);
        }

        for (position, entry) in roster.iter().enumerate() {
            if claims.is_claimed(position) {
                continue;
            }
            results.push(MatchResult {
                record: StructuredRecord::placeholder(
                    &entry.surname,
                    &entry.given_name,
                    &entry.tax_code,
                ),
                roster_index: Some(position),
                status: MatchStatus::RosterUnmatched,
                email: entry.email.clone(),
                score: 0,
                method: None,
            });
        }

        let report = MatchReport {
            results,
            threshold: self.threshold,
        };
        info!(
            "Matched {} of {} records, {} roster entries unclaimed",
            report.count(MatchStatus::Matched),
            records.len(),
            report.count(MatchStatus::RosterUnmatched)
        );
        report
    }

    fn exact(
        &self,
        record: &StructuredRecord,
        by_tax_code: &HashMap<String, usize>,
        claims: &ClaimSet,
    ) -> Option<Candidate> {
        let tax_code = record.tax_code.trim().to_uppercase();
        if tax_code.is_empty() {
            return None;
        }
        let position = *by_tax_code.get(&tax_code)?;
        if claims.is_claimed(position) {
            return None;
        }
        Some(Candidate {
            position,
            score: 100,
            method: MatchMethod::TaxCode,
        })
    }

    fn fuzzy(
        &self,
        record: &StructuredRecord,
        names: &[String],
        claims: &ClaimSet,
    ) -> Option<Candidate> {
        let name = normalize(&format!("{} {}", record.surname, record.given_name));
        if name.is_empty() {
            return None;
        }

        let mut best: Option<Candidate> = None;
        for (position, roster_name) in names.iter().enumerate() {
            if claims.is_claimed(position) {
                continue;
            }
            let score = name_similarity(&name, roster_name, self.compact_names);
            if best.is_none_or(|b| score > b.score) {
                best = Some(Candidate {
                    position,
                    score,
                    method: MatchMethod::FuzzyName,
                });
            }
        }

        best.filter(|b| b.score >= self.threshold)
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-cased tax code to roster position; later duplicates win.
fn tax_code_index(roster: &[RosterEntry]) -> HashMap<String, usize> {
    roster
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.tax_code.is_empty())
        .map(|(position, entry)| (entry.tax_code.to_uppercase(), position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(index: i32, tax_code: &str, surname: &str, given_name: &str) -> StructuredRecord {
        StructuredRecord {
            index,
            start_page: index - 1,
            end_page: index - 1,
            year: "2025".to_string(),
            tax_code: tax_code.to_string(),
            surname: surname.to_string(),
            given_name: given_name.to_string(),
            raw_text: String::new(),
        }
    }

    fn entry(surname: &str, given_name: &str, tax_code: &str, email: &str) -> RosterEntry {
        RosterEntry::new(surname, given_name, tax_code, email)
    }

    fn statuses(report: &MatchReport) -> Vec<MatchStatus> {
        report.results.iter().map(|r| r.status).collect()
    }

    #[test]
    fn test_exact_tax_code_ignores_names() {
        let records = vec![record(1, "RSSMRA80A01H501U", "XXX", "YYY")];
        let roster = vec![entry("Rossi", "Mario", "rssmra80a01h501u", "mario@example.it")];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.score, 100);
        assert_eq!(result.method, Some(MatchMethod::TaxCode));
        assert_eq!(result.email, "mario@example.it");
        assert_eq!(result.roster_index, Some(0));
    }

    #[test]
    fn test_fuzzy_compound_surname() {
        let records = vec![record(1, "", "DE LUCA", "GIUSEPPE")];
        let roster = vec![
            entry("Bianchi", "Laura", "", "laura@example.it"),
            entry("Deluca", "Giuseppe", "", "giuseppe@example.it"),
        ];

        // "DE LUCA GIUSEPPE" vs "DELUCA GIUSEPPE" scores 71 by token sort
        let plain = MatchingEngine::new().run(&records, &roster);
        assert_eq!(plain.results[0].status, MatchStatus::RecordUnmatched);

        let report = MatchingEngine::new().with_compact_names(true).run(&records, &roster);
        let result = &report.results[0];
        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.method, Some(MatchMethod::FuzzyName));
        assert_eq!(result.email, "giuseppe@example.it");
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_fuzzy_reordered_name() {
        let records = vec![record(1, "", "MARIO", "ROSSI")];
        let roster = vec![entry("Rossi", "Mario", "", "mario@example.it")];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results[0].status, MatchStatus::Matched);
        assert_eq!(report.results[0].score, 100);
    }

    #[test]
    fn test_unclaimed_roster_entry() {
        let records = vec![record(1, "RSSMRA80A01H501U", "ROSSI", "MARIO")];
        let roster = vec![
            entry("Rossi", "Mario", "RSSMRA80A01H501U", "mario@example.it"),
            entry("Verdi", "Giuseppe", "VRDGPP70C15L219C", "giuseppe@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(
            statuses(&report),
            vec![MatchStatus::Matched, MatchStatus::RosterUnmatched]
        );
        let unmatched = &report.results[1];
        assert_eq!(unmatched.record.start_page, -1);
        assert_eq!(unmatched.record.index, -1);
        assert_eq!(unmatched.record.surname, "VERDI");
        assert_eq!(unmatched.record.tax_code, "VRDGPP70C15L219C");
        assert_eq!(unmatched.email, "giuseppe@example.it");
        assert_eq!(unmatched.roster_index, Some(1));
    }

    #[test]
    fn test_every_record_and_entry_reported_once() {
        let records = vec![
            record(1, "RSSMRA80A01H501U", "ROSSI", "MARIO"),
            record(2, "", "NERI", "PAOLO"),
            record(3, "", "", ""),
        ];
        let roster = vec![
            entry("Rossi", "Mario", "RSSMRA80A01H501U", "a@example.it"),
            entry("Neri", "Paola", "", "b@example.it"),
            entry("Conti", "Anna", "", "c@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        let unclaimed = report.count(MatchStatus::RosterUnmatched);
        assert_eq!(report.results.len(), records.len() + unclaimed);
        assert_eq!(
            statuses(&report),
            vec![
                MatchStatus::Matched,
                MatchStatus::Matched,
                MatchStatus::RecordUnmatched,
                MatchStatus::RosterUnmatched,
            ]
        );

        let mut referenced: Vec<usize> =
            report.results.iter().filter_map(|r| r.roster_index).collect();
        referenced.sort_unstable();
        assert_eq!(referenced, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_double_claim() {
        let records = vec![
            record(1, "RSSMRA80A01H501U", "ROSSI", "MARIO"),
            record(2, "RSSMRA80A01H501U", "ROSSI", "MARIO"),
        ];
        let roster = vec![entry("Rossi", "Mario", "RSSMRA80A01H501U", "a@example.it")];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(
            statuses(&report),
            vec![MatchStatus::Matched, MatchStatus::RecordUnmatched]
        );
    }

    #[test]
    fn test_claimed_tax_code_falls_back_to_fuzzy() {
        let records = vec![
            record(1, "RSSMRA80A01H501U", "ROSSI", "MARIO"),
            record(2, "RSSMRA80A01H501U", "ROSSI", "MARIA"),
        ];
        let roster = vec![
            entry("Rossi", "Mario", "RSSMRA80A01H501U", "mario@example.it"),
            entry("Rossi", "Maria", "", "maria@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results[1].status, MatchStatus::Matched);
        assert_eq!(report.results[1].method, Some(MatchMethod::FuzzyName));
        assert_eq!(report.results[1].roster_index, Some(1));
        assert_eq!(report.results[1].score, 100);
    }

    #[test]
    fn test_exact_match_has_priority() {
        // Record 1 fuzzy-matches entry 0 perfectly but its tax code names entry 1.
        let records = vec![record(1, "BNCLRA85M41F205C", "ROSSI", "MARIO")];
        let roster = vec![
            entry("Rossi", "Mario", "", "rossi@example.it"),
            entry("Bianchi", "Laura", "BNCLRA85M41F205C", "laura@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results[0].roster_index, Some(1));
        assert_eq!(report.results[0].method, Some(MatchMethod::TaxCode));
        assert_eq!(report.results[1].status, MatchStatus::RosterUnmatched);
    }

    #[test]
    fn test_threshold_boundary() {
        // "ESPOSITO ANNA" vs "ESPOSITO ANNAMARIA" scores 84.
        let records = vec![record(1, "", "ESPOSITO", "ANNA")];
        let roster = vec![entry("Esposito", "Annamaria", "", "anna@example.it")];

        let at = MatchingEngine::new().with_threshold(84).run(&records, &roster);
        assert_eq!(at.results[0].status, MatchStatus::Matched);
        assert_eq!(at.results[0].score, 84);

        let above = MatchingEngine::new().with_threshold(85).run(&records, &roster);
        assert_eq!(above.results[0].status, MatchStatus::RecordUnmatched);
        assert_eq!(above.results[0].score, 0);
        assert_eq!(above.results[1].status, MatchStatus::RosterUnmatched);
    }

    #[test]
    fn test_ties_keep_earlier_entry() {
        let records = vec![record(1, "", "CONTI", "ANNA")];
        let roster = vec![
            entry("Conte", "Anna", "", "first@example.it"),
            entry("Conta", "Anna", "", "second@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results[0].roster_index, Some(0));
        assert_eq!(report.results[0].email, "first@example.it");
    }

    #[test]
    fn test_duplicate_tax_code_last_wins() {
        let records = vec![record(1, "RSSMRA80A01H501U", "ROSSI", "MARIO")];
        let roster = vec![
            entry("Rossi", "Mario", "RSSMRA80A01H501U", "old@example.it"),
            entry("Rossi", "Mario", "RSSMRA80A01H501U", "new@example.it"),
        ];

        let report = MatchingEngine::new().run(&records, &roster);
        assert_eq!(report.results[0].email, "new@example.it");
        assert_eq!(report.results[1].roster_index, Some(0));
    }

    #[test]
    fn test_empty_inputs() {
        let report = MatchingEngine::new().run(&[], &[]);
        assert!(report.results.is_empty());

        let roster = vec![entry("Rossi", "Mario", "", "")];
        let report = MatchingEngine::new().run(&[], &roster);
        assert_eq!(statuses(&report), vec![MatchStatus::RosterUnmatched]);
    }
}
