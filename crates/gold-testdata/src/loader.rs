//! Backend integration for loading a generated warehouse.

use crate::config::SchemaConfig;
use crate::generator::GeneratedWarehouse;
use crate::output::SqlOutput;
use async_trait::async_trait;
use gold_backend::{Backend, BackendError};

/// Result of loading a generated warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseLoadResult {
    pub products_loaded: usize,
    pub customers_loaded: usize,
    pub sales_loaded: usize,
}

impl std::fmt::Display for WarehouseLoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Loaded {} products, {} customers, {} sale lines",
            self.products_loaded, self.customers_loaded, self.sales_loaded
        )
    }
}

/// Extension trait for loading synthetic Gold relations into a backend.
#[async_trait]
pub trait WarehouseLoader: Backend {
    /// Replace the three relations with the generated data.
    ///
    /// Existing tables or views of the same names are dropped first, so loading is
    /// repeatable.
    ///
    /// ```ignore
    /// use gold_testdata::{presets, WarehouseGenerator, WarehouseLoader};
    /// use gold_backend_duckdb::DuckDbBackend;
    ///
    /// let config = presets::small();
    /// let backend = DuckDbBackend::in_memory(&config.schema.db_schema)?;
    /// let data = WarehouseGenerator::new(config.clone()).generate();
    /// backend.load_warehouse(&config.schema, &data).await?;
    /// ```
    async fn load_warehouse(
        &self,
        schema: &SchemaConfig,
        data: &GeneratedWarehouse,
    ) -> Result<WarehouseLoadResult, BackendError>;
}

#[async_trait]
impl<B: Backend + ?Sized> WarehouseLoader for B {
    async fn load_warehouse(
        &self,
        schema: &SchemaConfig,
        data: &GeneratedWarehouse,
    ) -> Result<WarehouseLoadResult, BackendError> {
        self.ensure_schema(&schema.db_schema).await?;

        let existing = self.list_tables(Some(&schema.db_schema)).await?;
        for table in [&schema.fact_sales, &schema.dim_products, &schema.dim_customers] {
            let is_view = existing
                .iter()
                .any(|t| &t.name == table && t.table_type == "VIEW");

            if is_view {
                self.drop_view_if_exists(&schema.db_schema, table).await?;
            } else {
                self.drop_table_if_exists(&schema.db_schema, table).await?;
            }
        }

        let sql = SqlOutput::new(schema.clone())
            .with_catalog(self.catalog())
            .format_all(&data.products, &data.customers, &data.sales);
        self.execute_batch(&sql).await?;

        let result = WarehouseLoadResult {
            products_loaded: self
                .get_row_count(&schema.db_schema, &schema.dim_products)
                .await?,
            customers_loaded: self
                .get_row_count(&schema.db_schema, &schema.dim_customers)
                .await?,
            sales_loaded: self
                .get_row_count(&schema.db_schema, &schema.fact_sales)
                .await?,
        };

        tracing::info!(schema = %schema.db_schema, "{}", result);
        Ok(result)
    }
}
