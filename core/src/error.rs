//! Error types for the core crate
//!
//! Every table and schema operation reports failures through a single
//! [`ValidationError`]. Its [`ValidationErrorKind`] tells callers which
//! check rejected the call without matching on message text.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Sub-kind of a [`ValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A schema declared a type tag outside the supported vocabulary
    UnknownColumnType,

    /// A schema declared the same column name twice
    DuplicateColumn,

    /// A date interval was built with its start after its end
    InvalidInterval,

    /// A row failed validation against the table schema
    RowValidation,

    /// A positional index was outside the current row range
    IndexOutOfRange,

    /// A column name was not part of the table schema
    UnknownColumn,

    /// A query predicate could not be parsed or evaluated
    QueryError,
}

/// A single failing field inside a row validation report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Column the failure belongs to
    pub column: String,

    /// Human-readable cause
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(column: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.column, self.message)
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("{} {}: {}", errors.len(), noun, details.join("; "))
}

/// Error raised when an operation could not complete because its input or
/// the table state was invalid
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Unknown column type tag
    #[error("Unknown type '{tag}' for column '{column}'")]
    UnknownColumnType {
        /// Column carrying the tag
        column: String,
        /// The rejected tag
        tag: String,
    },

    /// Column declared more than once
    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    /// Interval start after its end
    #[error("Start date must be before end date: {start} > {end}")]
    InvalidInterval {
        /// Interval start
        start: NaiveDateTime,
        /// Interval end
        end: NaiveDateTime,
    },

    /// Row validation failure, listing every failing field
    #[error("Validation failed for '{table}': {}", render_field_errors(.errors))]
    RowValidation {
        /// Name of the schema the row was checked against
        table: String,
        /// All failing fields, in schema order
        errors: Vec<FieldError>,
    },

    /// Index outside `[0, len)`
    #[error("Index {index} out of range for table with {len} rows")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Row count at the time of the call
        len: usize,
    },

    /// Column not in the schema
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    /// Query parse or evaluation failure
    #[error("Query failed: {reason} (query: `{query}`)")]
    QueryError {
        /// Source text of the predicate
        query: String,
        /// Cause of the failure
        reason: String,
    },
}

impl ValidationError {
    /// Get the sub-kind of this error
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::UnknownColumnType { .. } => ValidationErrorKind::UnknownColumnType,
            ValidationError::DuplicateColumn(_) => ValidationErrorKind::DuplicateColumn,
            ValidationError::InvalidInterval { .. } => ValidationErrorKind::InvalidInterval,
            ValidationError::RowValidation { .. } => ValidationErrorKind::RowValidation,
            ValidationError::IndexOutOfRange { .. } => ValidationErrorKind::IndexOutOfRange,
            ValidationError::UnknownColumn(_) => ValidationErrorKind::UnknownColumn,
            ValidationError::QueryError { .. } => ValidationErrorKind::QueryError,
        }
    }

    /// Failing fields of a row validation error, empty for other kinds
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::RowValidation { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Convert a displayable error into a QueryError for `query`
pub fn to_query_error<E: Display>(query: &str, err: E) -> ValidationError {
    ValidationError::QueryError {
        query: query.to_string(),
        reason: err.to_string(),
    }
}

/// Configuration loading/saving error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, ValidationError>;
