//! Backend trait and types for Gold-layer warehouse engines.
//!
//! This crate defines the abstract interface the analytics layer talks to,
//! so the report and query code never depends on a particular engine.

mod error;
mod naming;
mod types;

pub use error::BackendError;
pub use naming::{qualified_name, qualified_schema, quote_identifier};
pub use types::{ColumnInfo, ExecutionResult, Materialization, TableInfo};

use arrow::array::RecordBatch;
use async_trait::async_trait;

/// Abstract interface for warehouse engines.
///
/// Backends are responsible for:
/// - Executing read-only SQL queries
/// - Creating the report views (and, for seeding, tables)
/// - Answering catalog questions (tables, columns, row counts)
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a SQL query and return results.
    async fn execute_sql(&self, sql: &str) -> Result<Vec<RecordBatch>, BackendError>;

    /// Execute one or more statements that return no rows.
    async fn execute_batch(&self, sql: &str) -> Result<(), BackendError>;

    /// Create a table from a SQL query.
    async fn create_table_as(&self, schema: &str, name: &str, sql: &str)
        -> Result<(), BackendError>;

    /// Create a view from a SQL query.
    async fn create_view_as(&self, schema: &str, name: &str, sql: &str)
        -> Result<(), BackendError>;

    /// Drop a table if it exists.
    async fn drop_table_if_exists(&self, schema: &str, name: &str) -> Result<(), BackendError>;

    /// Drop a view if it exists.
    async fn drop_view_if_exists(&self, schema: &str, name: &str) -> Result<(), BackendError>;

    /// Get the row count of a table or view.
    async fn get_row_count(&self, schema: &str, name: &str) -> Result<usize, BackendError>;

    /// Get a preview of a table or view (first N rows).
    async fn get_preview(
        &self,
        schema: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<RecordBatch>, BackendError>;

    /// Check if a table or view exists.
    async fn table_exists(&self, schema: &str, name: &str) -> Result<bool, BackendError>;

    /// Ensure a schema exists, creating it if necessary.
    async fn ensure_schema(&self, schema: &str) -> Result<(), BackendError>;

    /// List tables and views, optionally restricted to one schema.
    ///
    /// Naming a schema that does not exist is a `SchemaNotFound` error.
    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableInfo>, BackendError>;

    /// Describe the columns of a table or view, in ordinal order.
    async fn describe_table(&self, schema: &str, name: &str)
        -> Result<Vec<ColumnInfo>, BackendError>;

    /// Catalog holding the backend's relations, when names must carry it.
    fn catalog(&self) -> Option<&str> {
        None
    }

    /// Name of a relation as it must appear in SQL sent to this backend.
    fn qualify(&self, schema: &str, name: &str) -> String {
        qualified_name(self.catalog(), schema, name)
    }

    /// Read every row of a relation.
    async fn read_relation(&self, schema: &str, name: &str) -> Result<Vec<RecordBatch>, BackendError> {
        if !self.table_exists(schema, name).await? {
            return Err(BackendError::not_found(schema, name));
        }
        self.execute_sql(&format!("SELECT * FROM {}", self.qualify(schema, name)))
            .await
    }

    /// Drop and recreate a relation, then report its size.
    ///
    /// This is a convenience method that combines drop + create operations.
    async fn materialize(
        &self,
        schema: &str,
        name: &str,
        sql: &str,
        materialization: Materialization,
        show_preview: bool,
    ) -> Result<ExecutionResult, BackendError> {
        let start = std::time::Instant::now();

        match materialization {
            Materialization::Table => {
                self.drop_table_if_exists(schema, name).await?;
                self.create_table_as(schema, name, sql).await?;
            }
            Materialization::View => {
                self.drop_view_if_exists(schema, name).await?;
                self.create_view_as(schema, name, sql).await?;
            }
        }

        let duration = start.elapsed();
        let row_count = self.get_row_count(schema, name).await?;
        tracing::info!(
            relation = %self.qualify(schema, name),
            %materialization,
            row_count,
            "Materialized relation"
        );

        let preview = if show_preview {
            Some(self.get_preview(schema, name, 10).await?)
        } else {
            None
        };

        Ok(ExecutionResult {
            relation: name.to_string(),
            duration,
            row_count,
            preview,
        })
    }
}
