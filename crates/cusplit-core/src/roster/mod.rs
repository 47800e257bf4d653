//! Roster loading from CSV and spreadsheet files.

mod columns;
mod loader;

pub use columns::{ColumnMap, RosterField, normalize_column};
pub use loader::{RosterFormat, RosterLoader};

use crate::error::RosterError;

/// Result type for roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;
