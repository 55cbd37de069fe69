//! Common types used across backends.

use arrow::array::RecordBatch;
use std::time::Duration;

/// Result of materializing a relation.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Name of the relation that was created.
    pub relation: String,

    /// How long creation took.
    pub duration: Duration,

    /// Number of rows in the resulting table/view.
    pub row_count: usize,

    /// Optional preview of the first few rows.
    pub preview: Option<Vec<RecordBatch>>,
}

/// How a relation should be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialization {
    /// Materialize as a table (persisted).
    Table,

    /// Materialize as a view (computed on query).
    #[default]
    View,
}

impl std::fmt::Display for Materialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Materialization::Table => write!(f, "table"),
            Materialization::View => write!(f, "view"),
        }
    }
}

impl std::str::FromStr for Materialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Materialization::Table),
            "view" => Ok(Materialization::View),
            _ => Err(format!("Unknown materialization: {}", s)),
        }
    }
}

/// A table or view visible in the warehouse catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    /// `BASE TABLE` or `VIEW`, as reported by `information_schema`.
    pub table_type: String,
}

/// One column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}
