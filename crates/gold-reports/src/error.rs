//! Report error types.

use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised while moving relations in and out of Arrow.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A required column is absent from a source relation.
    #[error("Column '{column}' not found in {relation}")]
    MissingColumn { relation: String, column: String },

    /// A column exists but cannot be cast to the expected type.
    #[error("Column '{column}' in {relation} cannot be read as {expected}: {source}")]
    Decode {
        relation: String,
        column: String,
        expected: String,
        #[source]
        source: ArrowError,
    },

    /// A non-nullable column holds a NULL.
    #[error("Unexpected NULL in {relation}.{column} at row {row}")]
    NullValue {
        relation: String,
        column: String,
        row: usize,
    },

    /// Report rows could not be assembled into a record batch.
    #[error("Failed to build {report} batch: {source}")]
    Encode {
        report: String,
        #[source]
        source: ArrowError,
    },
}

impl ReportError {
    pub fn missing_column(relation: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            relation: relation.into(),
            column: column.into(),
        }
    }

    pub fn null_value(relation: impl Into<String>, column: impl Into<String>, row: usize) -> Self {
        Self::NullValue {
            relation: relation.into(),
            column: column.into(),
            row,
        }
    }
}
