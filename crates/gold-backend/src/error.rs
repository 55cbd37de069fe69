//! Backend error types.

use thiserror::Error;

/// Errors that can occur during backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to open or reach the warehouse.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Failed to execute a SQL statement.
    #[error("Execution failed for '{target}': {message}")]
    ExecutionFailed { target: String, message: String },

    /// Table or view not found.
    #[error("Table or view not found: {schema}.{name}")]
    NotFound { schema: String, name: String },

    /// Schema does not exist.
    #[error("Schema not found: {schema}")]
    SchemaNotFound { schema: String },

    /// Generic backend error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create an execution failed error.
    pub fn execution_failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Create a schema not found error.
    pub fn schema_not_found(schema: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            schema: schema.into(),
        }
    }
}
