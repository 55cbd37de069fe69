//! DuckDB backend implementation for Gold-layer analytics.

use anyhow::Context;
use arrow::array::RecordBatch;
use async_trait::async_trait;
use duckdb::{params_from_iter, Connection};
use gold_backend::{qualified_schema, Backend, BackendError, ColumnInfo, TableInfo};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// DuckDB backend.
///
/// Wraps a DuckDB connection and implements the Backend trait.
/// DuckDB operations are synchronous, so they're wrapped in spawn_blocking.
/// Uses Arc<Mutex<Connection>> since Connection is not Sync.
///
/// Relation names are rendered with the database's catalog, so a file whose
/// stem equals the schema name (`gold.duckdb` with schema `gold`) stays
/// unambiguous.
pub struct DuckDbBackend {
    connection: Arc<Mutex<Connection>>,
    catalog: String,
}

/// Read the catalog name and create the schema inside it.
fn prepare(connection: &Connection, schema: &str) -> Result<String, BackendError> {
    let catalog: String = connection
        .query_row("SELECT current_database()", [], |row| row.get(0))
        .map_err(|e| BackendError::connection_failed(e.to_string()))?;

    let create_sql = format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        qualified_schema(Some(&catalog), schema)
    );
    connection
        .execute(&create_sql, [])
        .map_err(|e| BackendError::execution_failed(schema, e.to_string()))?;

    Ok(catalog)
}

fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, BackendError> {
    connection
        .lock()
        .map_err(|_| BackendError::connection_failed("DuckDB connection mutex poisoned"))
}

impl DuckDbBackend {
    /// Open (or create) a database file and ensure the schema exists.
    pub async fn new(database_path: &Path, schema: &str) -> Result<Self, BackendError> {
        let database_path = database_path.to_owned();
        let schema = schema.to_string();

        let (connection, catalog) = tokio::task::spawn_blocking(move || {
            // Create parent directory if needed
            if let Some(parent) = database_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }

            let connection = Connection::open(&database_path)
                .with_context(|| format!("Failed to open DuckDB database: {:?}", database_path))?;
            let catalog = prepare(&connection, &schema)
                .with_context(|| format!("Failed to create schema: {}", schema))?;

            tracing::debug!(path = ?database_path, %catalog, %schema, "Opened DuckDB database");
            Ok::<_, anyhow::Error>((connection, catalog))
        })
        .await
        .map_err(|e| BackendError::connection_failed(e.to_string()))?
        .map_err(|e| BackendError::connection_failed(format!("{:#}", e)))?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            catalog,
        })
    }

    /// Open a private in-memory database with the schema created.
    pub fn in_memory(schema: &str) -> Result<Self, BackendError> {
        let connection = Connection::open_in_memory()
            .map_err(|e| BackendError::connection_failed(e.to_string()))?;
        let catalog = prepare(&connection, schema)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            catalog,
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, BackendError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let conn = lock(&connection)?;
            f(&conn)
        })
        .await
        .map_err(|e| BackendError::Other(e.into()))?
    }

    /// Execute a statement that returns no rows, reporting failures against `target`.
    async fn execute_statement(&self, target: String, sql: String) -> Result<(), BackendError> {
        tracing::debug!(%target, %sql, "Executing statement");

        self.with_connection(move |conn| {
            conn.execute(&sql, [])
                .map_err(|e| BackendError::execution_failed(target, e.to_string()))?;
            Ok(())
        })
        .await
    }

    /// Run a query and collect its Arrow result, reporting failures against `target`.
    async fn query_arrow(&self, target: String, sql: String) -> Result<Vec<RecordBatch>, BackendError> {
        tracing::debug!(%target, %sql, "Executing query");

        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| BackendError::execution_failed(target.clone(), e.to_string()))?;

            let result = stmt
                .query_arrow([])
                .map_err(|e| BackendError::execution_failed(target, e.to_string()))?;

            Ok(result.collect())
        })
        .await
    }

    async fn schema_exists(&self, schema: &str) -> Result<bool, BackendError> {
        let query = "SELECT COUNT(*) > 0 FROM information_schema.schemata \
                     WHERE catalog_name = ? AND schema_name = ?";
        let catalog = self.catalog.clone();
        let schema = schema.to_string();

        self.with_connection(move |conn| {
            conn.query_row(query, [&catalog, &schema], |row| row.get(0))
                .map_err(|e| BackendError::execution_failed("information_schema", e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl Backend for DuckDbBackend {
    fn catalog(&self) -> Option<&str> {
        Some(&self.catalog)
    }

    async fn execute_sql(&self, sql: &str) -> Result<Vec<RecordBatch>, BackendError> {
        self.query_arrow("query".to_string(), sql.to_string()).await
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), BackendError> {
        let sql = sql.to_string();
        tracing::debug!(%sql, "Executing batch");

        self.with_connection(move |conn| {
            conn.execute_batch(&sql)
                .map_err(|e| BackendError::execution_failed("batch", e.to_string()))
        })
        .await
    }

    async fn create_table_as(
        &self,
        schema: &str,
        name: &str,
        sql: &str,
    ) -> Result<(), BackendError> {
        let table_name = self.qualify(schema, name);
        let create_sql = format!("CREATE TABLE {} AS {}", table_name, sql);
        self.execute_statement(table_name, create_sql).await
    }

    async fn create_view_as(
        &self,
        schema: &str,
        name: &str,
        sql: &str,
    ) -> Result<(), BackendError> {
        let view_name = self.qualify(schema, name);
        let create_sql = format!("CREATE VIEW {} AS {}", view_name, sql);
        self.execute_statement(view_name, create_sql).await
    }

    async fn drop_table_if_exists(&self, schema: &str, name: &str) -> Result<(), BackendError> {
        let table_name = self.qualify(schema, name);
        let drop_sql = format!("DROP TABLE IF EXISTS {}", table_name);
        self.execute_statement(table_name, drop_sql).await
    }

    async fn drop_view_if_exists(&self, schema: &str, name: &str) -> Result<(), BackendError> {
        let view_name = self.qualify(schema, name);
        let drop_sql = format!("DROP VIEW IF EXISTS {}", view_name);
        self.execute_statement(view_name, drop_sql).await
    }

    async fn get_row_count(&self, schema: &str, name: &str) -> Result<usize, BackendError> {
        let table_name = self.qualify(schema, name);
        let sql = format!("SELECT COUNT(*) FROM {}", table_name);

        self.with_connection(move |conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| BackendError::execution_failed(table_name, e.to_string()))?;
            Ok(count as usize)
        })
        .await
    }

    async fn get_preview(
        &self,
        schema: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<RecordBatch>, BackendError> {
        let table_name = self.qualify(schema, name);
        let sql = format!("SELECT * FROM {} LIMIT {}", table_name, limit);
        self.query_arrow(table_name, sql).await
    }

    async fn table_exists(&self, schema: &str, name: &str) -> Result<bool, BackendError> {
        let query = "SELECT COUNT(*) > 0 FROM information_schema.tables \
                     WHERE table_catalog = ? AND table_schema = ? AND table_name = ?";
        let catalog = self.catalog.clone();
        let schema = schema.to_string();
        let name = name.to_string();

        self.with_connection(move |conn| {
            conn.query_row(query, [&catalog, &schema, &name], |row| row.get(0))
                .map_err(|e| BackendError::execution_failed("information_schema", e.to_string()))
        })
        .await
    }

    async fn ensure_schema(&self, schema: &str) -> Result<(), BackendError> {
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            qualified_schema(Some(&self.catalog), schema)
        );
        self.execute_statement(schema.to_string(), sql).await
    }

    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableInfo>, BackendError> {
        if let Some(schema) = schema {
            if !self.schema_exists(schema).await? {
                return Err(BackendError::schema_not_found(schema));
            }
        }

        let mut filters = vec![self.catalog.clone()];
        filters.extend(schema.map(str::to_string));
        let sql = if schema.is_none() {
            "SELECT table_schema, table_name, table_type FROM information_schema.tables \
             WHERE table_catalog = ? AND table_schema NOT IN ('information_schema', 'pg_catalog') \
             ORDER BY table_schema, table_name"
        } else {
            "SELECT table_schema, table_name, table_type FROM information_schema.tables \
             WHERE table_catalog = ? AND table_schema = ? ORDER BY table_name"
        };

        self.with_connection(move |conn| {
            let failed = |e: duckdb::Error| {
                BackendError::execution_failed("information_schema.tables", e.to_string())
            };

            let mut stmt = conn.prepare(sql).map_err(failed)?;
            let rows = stmt
                .query_map(params_from_iter(filters.iter()), |row| {
                    Ok(TableInfo {
                        schema: row.get(0)?,
                        name: row.get(1)?,
                        table_type: row.get(2)?,
                    })
                })
                .map_err(failed)?;

            let tables = rows.collect::<Result<Vec<_>, _>>().map_err(failed)?;
            Ok(tables)
        })
        .await
    }

    async fn describe_table(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Vec<ColumnInfo>, BackendError> {
        let sql = "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
                   WHERE table_catalog = ? AND table_schema = ? AND table_name = ? \
                   ORDER BY ordinal_position";
        let catalog = self.catalog.clone();
        let schema = schema.to_string();
        let name = name.to_string();

        let columns = self
            .with_connection({
                let schema = schema.clone();
                let name = name.clone();
                move |conn| {
                    let failed = |e: duckdb::Error| {
                        BackendError::execution_failed("information_schema.columns", e.to_string())
                    };

                    let mut stmt = conn.prepare(sql).map_err(failed)?;
                    let rows = stmt
                        .query_map([&catalog, &schema, &name], |row| {
                            let nullable: String = row.get(2)?;
                            Ok(ColumnInfo {
                                name: row.get(0)?,
                                data_type: row.get(1)?,
                                nullable: nullable.eq_ignore_ascii_case("YES"),
                            })
                        })
                        .map_err(failed)?;

                    let columns = rows.collect::<Result<Vec<_>, _>>().map_err(failed)?;
                    Ok(columns)
                }
            })
            .await?;

        if columns.is_empty() {
            return Err(BackendError::not_found(schema, name));
        }

        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gold_backend::Materialization;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_backend_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.duckdb");

        let _backend = DuckDbBackend::new(&db_path, "gold").await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_materialize_table() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();

        let sql = "SELECT 1 as id, 'test' as name";
        let result = backend
            .materialize("gold", "test_table", sql, Materialization::Table, false)
            .await
            .unwrap();

        assert_eq!(result.relation, "test_table");
        assert_eq!(result.row_count, 1);
        assert!(result.preview.is_none());
    }

    #[tokio::test]
    async fn test_materialize_view_twice() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();

        let sql = "SELECT 1 as id UNION SELECT 2 UNION SELECT 3";
        for _ in 0..2 {
            let result = backend
                .materialize("gold", "test_view", sql, Materialization::View, true)
                .await
                .unwrap();

            assert_eq!(result.row_count, 3);
            let batches = result.preview.unwrap();
            let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
            assert_eq!(total_rows, 3);
        }
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        backend
            .execute_batch(
                "CREATE TABLE gold.dim_products (product_key INTEGER NOT NULL, product_name VARCHAR);\
                 CREATE VIEW gold.product_names AS SELECT product_name FROM gold.dim_products;",
            )
            .await
            .unwrap();

        assert!(backend.table_exists("gold", "dim_products").await.unwrap());
        assert!(!backend.table_exists("gold", "fact_sales").await.unwrap());

        let tables = backend.list_tables(Some("gold")).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["dim_products", "product_names"]);
        assert_eq!(tables[1].table_type, "VIEW");

        let columns = backend.describe_table("gold", "dim_products").await.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "product_key");
        assert_eq!(columns[0].data_type, "INTEGER");
        assert!(!columns[0].nullable);
        assert!(columns[1].nullable);
    }

    #[tokio::test]
    async fn test_describe_missing_table() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        let err = backend.describe_table("gold", "nope").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_relation() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        let err = backend.read_relation("gold", "fact_sales").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_database_named_after_schema() {
        let temp_dir = TempDir::new().unwrap();
        let backend = DuckDbBackend::new(&temp_dir.path().join("gold.duckdb"), "gold")
            .await
            .unwrap();

        assert_eq!(backend.catalog(), Some("gold"));
        assert_eq!(backend.qualify("gold", "fact_sales"), "\"gold\".gold.fact_sales");

        backend.ensure_schema("gold").await.unwrap();
        let result = backend
            .materialize("gold", "fact_sales", "SELECT 1 AS order_key", Materialization::Table, false)
            .await
            .unwrap();
        assert_eq!(result.row_count, 1);

        backend
            .materialize("gold", "fact_view", "SELECT * FROM \"gold\".gold.fact_sales", Materialization::View, false)
            .await
            .unwrap();
        assert!(backend.table_exists("gold", "fact_view").await.unwrap());

        let batches = backend.read_relation("gold", "fact_sales").await.unwrap();
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 1);

        let tables = backend.list_tables(Some("gold")).await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(backend.describe_table("gold", "fact_sales").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_tables_in_missing_schema() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        let err = backend.list_tables(Some("silver")).await.unwrap_err();
        assert!(matches!(err, BackendError::SchemaNotFound { ref schema } if schema == "silver"));

        assert!(backend.list_tables(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_sql_reports_execution_failure() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        let err = backend.execute_sql("SELEC 1").await.unwrap_err();
        assert!(matches!(err, BackendError::ExecutionFailed { .. }));
    }
}
