//! Data models shared by the pipeline stages.

pub mod config;
pub mod matching;
pub mod record;
pub mod roster;

pub use config::CuConfig;
pub use matching::{MatchMethod, MatchReport, MatchResult, MatchStatus};
pub use record::{
    ExportNamer, PageText, RecordBoundary, StructuredRecord, export_names, title_case,
};
pub use roster::RosterEntry;
