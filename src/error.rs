//! Error types shared across the crate.
//!
//! Storage, filesystem and serialization failures are folded into
//! [`RomodoroError`] so store and export code can use `?` throughout.
//! Bad setup input has its own [`SetupError`], which the controller turns
//! into a re-prompt and never propagates.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RomodoroError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A stored timestamp could not be parsed back
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] SetupError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RomodoroError>;

impl RomodoroError {
    pub fn other(msg: impl Into<String>) -> Self {
        RomodoroError::Other(msg.into())
    }
}

/// Rejected focus/rest entry on the timer setup screen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("no value entered")]
    Empty,

    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: i64, min: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_messages() {
        assert_eq!(SetupError::Empty.to_string(), "no value entered");
        assert_eq!(
            SetupError::NotANumber("abc".into()).to_string(),
            "'abc' is not a whole number"
        );
        assert_eq!(
            SetupError::OutOfRange {
                value: 0,
                min: 1,
                max: 999
            }
            .to_string(),
            "0 is outside 1..=999"
        );
    }

    #[test]
    fn database_error_converts() {
        let err: RomodoroError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RomodoroError::Database(_)));
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn validation_error_converts() {
        let err: RomodoroError = SetupError::Empty.into();
        assert_eq!(err.to_string(), "Invalid input: no value entered");
    }
}
