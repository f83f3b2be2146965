//! Inventory domain model for mold/cutter tooling assets.
//!
//! # Responsibility
//! - Define the flat tabular records loaded from CSV or SQLite.
//! - Define the activity records written by state-change actions.
//!
//! # Invariants
//! - Foreign keys are plain strings and may be absent or dangling.
//! - Records are joined by trimmed string equality, never by position.

pub mod activity;
pub mod asset;
pub mod reference;
pub mod tables;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for a single model record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A primary key or other required identifier is blank after trim.
    BlankField(&'static str),
    /// A free-text field exceeds its maximum length in characters.
    TooLong { field: &'static str, max_chars: usize },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Returns the trimmed key when it is non-blank.
///
/// Every join and lookup goes through this helper so that `" 12 "` and `"12"`
/// address the same record.
pub fn normalize_key(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Same as [`normalize_key`] for optional foreign-key columns.
pub fn normalize_opt_key(value: Option<&str>) -> Option<&str> {
    value.and_then(normalize_key)
}

pub(crate) fn require_non_blank(
    value: &str,
    field: &'static str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(())
}
