use crate::config::WarehouseLayout;
use crate::errors::CliError;
use crate::queries::NamedQuery;
use crate::views::ReportView;
use anyhow::{Context, Result};
use arrow::array::RecordBatch;
use chrono::NaiveDate;
use gold_backend::{Backend, ExecutionResult, Materialization};
use gold_reports::{
    build_customer_report, build_product_report, decode_customers, decode_products,
    decode_sale_lines, Customer, CustomerReportRow, Product, ProductReportRow, SaleLine,
};

/// Validate that the three Gold relations exist in the backend.
pub async fn validate_sources(backend: &dyn Backend, layout: &WarehouseLayout) -> Result<()> {
    let mut missing = Vec::new();

    for (schema, name) in layout.sources() {
        let exists = backend.table_exists(schema, name).await.unwrap_or(false);

        if !exists {
            missing.push(format!("{}.{}", schema, name));
        }
    }

    if !missing.is_empty() {
        return Err(CliError::SourceTablesNotFound { missing }.into());
    }

    Ok(())
}

/// A relation in the target schema with its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSummary {
    pub name: String,
    pub table_type: String,
    pub column_count: usize,
    pub row_count: usize,
}

/// Every relation in the target schema, plus the source relations that are missing.
pub async fn inspect(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
) -> Result<(Vec<RelationSummary>, Vec<String>)> {
    let tables = backend
        .list_tables(Some(&layout.schema))
        .await
        .with_context(|| format!("Failed to list relations in schema '{}'", layout.schema))?;

    let mut summaries = Vec::with_capacity(tables.len());
    for table in tables {
        let columns = backend.describe_table(&table.schema, &table.name).await?;
        let row_count = backend.get_row_count(&table.schema, &table.name).await?;
        summaries.push(RelationSummary {
            name: table.name,
            table_type: table.table_type,
            column_count: columns.len(),
            row_count,
        });
    }

    let missing = layout
        .sources()
        .iter()
        .filter(|(_, name)| !summaries.iter().any(|s| s.name == *name))
        .map(|(schema, name)| format!("{}.{}", schema, name))
        .collect();

    Ok((summaries, missing))
}

/// The layout with relation names qualified the way `backend` needs them.
fn bind(layout: &WarehouseLayout, backend: &dyn Backend) -> WarehouseLayout {
    layout.clone().with_catalog(backend.catalog())
}

/// Run a catalog query.
pub async fn run_query(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    query: &NamedQuery,
    limit: Option<usize>,
    as_of: Option<NaiveDate>,
) -> Result<Vec<RecordBatch>> {
    let sql = query.render(&bind(layout, backend), limit, as_of);
    tracing::debug!(query = query.name, %sql, "Running query");

    backend.execute_sql(&sql).await.map_err(|e| {
        CliError::QueryError {
            name: query.name.to_string(),
            sql,
            source: e.into(),
        }
        .into()
    })
}

/// The three Gold relations decoded into memory.
#[derive(Debug, Clone, Default)]
pub struct WarehouseSnapshot {
    pub sales: Vec<SaleLine>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
}

/// Read and decode the fact and both dimensions.
pub async fn load_snapshot(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
) -> Result<WarehouseSnapshot> {
    validate_sources(backend, layout).await?;
    let relations = &layout.relations;

    let batches = backend
        .read_relation(&layout.schema, &relations.fact_sales)
        .await?;
    let sales = decode_sale_lines(&batches)
        .with_context(|| format!("Failed to decode {}", layout.fact_sales()))?;

    let batches = backend
        .read_relation(&layout.schema, &relations.dim_products)
        .await?;
    let products = decode_products(&batches)
        .with_context(|| format!("Failed to decode {}", layout.dim_products()))?;

    let batches = backend
        .read_relation(&layout.schema, &relations.dim_customers)
        .await?;
    let customers = decode_customers(&batches)
        .with_context(|| format!("Failed to decode {}", layout.dim_customers()))?;

    tracing::info!(
        sales = sales.len(),
        products = products.len(),
        customers = customers.len(),
        "Loaded Gold relations"
    );

    Ok(WarehouseSnapshot {
        sales,
        products,
        customers,
    })
}

pub async fn product_report(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    as_of: NaiveDate,
) -> Result<Vec<ProductReportRow>> {
    let snapshot = load_snapshot(backend, layout)
        .await
        .map_err(|e| CliError::ReportError {
            report: ReportView::Products.to_string(),
            source: e,
        })?;
    Ok(build_product_report(&snapshot.sales, &snapshot.products, as_of))
}

pub async fn customer_report(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    as_of: NaiveDate,
) -> Result<Vec<CustomerReportRow>> {
    let snapshot = load_snapshot(backend, layout)
        .await
        .map_err(|e| CliError::ReportError {
            report: ReportView::Customers.to_string(),
            source: e,
        })?;
    Ok(build_customer_report(&snapshot.sales, &snapshot.customers, as_of))
}

/// Create or replace both report views in the target schema.
///
/// Without `as_of` the views follow `current_date`.
pub async fn install_views(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    as_of: Option<NaiveDate>,
    show_results: bool,
) -> Result<Vec<ExecutionResult>> {
    validate_sources(backend, layout).await?;
    let bound = bind(layout, backend);

    let mut results = Vec::new();
    for view in ReportView::ALL {
        let sql = view.sql(&bound, as_of);
        tracing::debug!(view = view.name(), %sql, "Installing view");

        let result = backend
            .materialize(
                &layout.schema,
                view.name(),
                &sql,
                Materialization::View,
                show_results,
            )
            .await
            .map_err(|e| CliError::QueryError {
                name: view.name().to_string(),
                sql: sql.clone(),
                source: e.into(),
            })?;
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gold_backend_duckdb::DuckDbBackend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_sources_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let backend = DuckDbBackend::new(&temp_dir.path().join("empty.duckdb"), "gold")
            .await
            .unwrap();

        let err = validate_sources(&backend, &WarehouseLayout::default())
            .await
            .unwrap_err();
        match err.downcast_ref::<CliError>() {
            Some(CliError::SourceTablesNotFound { missing }) => {
                assert_eq!(
                    missing,
                    &vec![
                        "gold.fact_sales".to_string(),
                        "gold.dim_products".to_string(),
                        "gold.dim_customers".to_string()
                    ]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inspect_empty_schema() {
        let backend = DuckDbBackend::in_memory("gold").unwrap();
        let (relations, missing) = inspect(&backend, &WarehouseLayout::default())
            .await
            .unwrap();
        assert!(relations.is_empty());
        assert_eq!(missing.len(), 3);
    }
}
