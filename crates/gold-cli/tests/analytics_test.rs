//! Integration tests for reports, report views and the query catalog

use arrow::array::{AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use chrono::NaiveDate;
use gold_backend::Backend;
use gold_backend_duckdb::DuckDbBackend;
use gold_cli::{executor, queries, CliError, ReportView, WarehouseLayout, CATALOG};
use gold_reports::{Customer, Product, ProductSegment, SaleLine};
use gold_testdata::{presets, GeneratedWarehouse, WarehouseGenerator, WarehouseLoader};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn column_f64(batches: &[RecordBatch], name: &str) -> Vec<Option<f64>> {
    batches
        .iter()
        .flat_map(|batch| {
            let column = cast(batch.column_by_name(name).unwrap(), &DataType::Float64).unwrap();
            column.as_primitive::<Float64Type>().iter().collect::<Vec<_>>()
        })
        .collect()
}

fn column_i64(batches: &[RecordBatch], name: &str) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|batch| {
            let column = cast(batch.column_by_name(name).unwrap(), &DataType::Int64).unwrap();
            column.as_primitive::<Int64Type>().iter().collect::<Vec<_>>()
        })
        .collect()
}

fn column_str(batches: &[RecordBatch], name: &str) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|batch| {
            let column = cast(batch.column_by_name(name).unwrap(), &DataType::Utf8).unwrap();
            column
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(str::to_string))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6 * a.abs().max(1.0)
}

/// One product bought twice five months apart, plus an undated line.
fn fixture() -> GeneratedWarehouse {
    GeneratedWarehouse {
        products: vec![Product {
            product_key: 1,
            product_name: "Road-150 Red".to_string(),
            category: Some("Bikes".to_string()),
            sub_category: Some("Road Bikes".to_string()),
            cost: Some(2171.0),
        }],
        customers: vec![
            Customer {
                customer_key: 7,
                customer_number: "AW00011007".to_string(),
                first_name: Some("Jon".to_string()),
                last_name: Some("Yang".to_string()),
                birthdate: date(1971, 10, 6),
                gender: Some("Male".to_string()),
                country: Some("Australia".to_string()),
            },
            Customer {
                customer_key: 8,
                customer_number: "AW00011008".to_string(),
                first_name: Some("Eugene".to_string()),
                last_name: None,
                birthdate: None,
                gender: Some("Male".to_string()),
                country: Some("Canada".to_string()),
            },
        ],
        sales: vec![
            SaleLine::new("A", date(2023, 1, 10), 1, 7, 100.0, 2),
            SaleLine::new("B", date(2023, 6, 10), 1, 8, 60000.0, 1),
            SaleLine::new("C", None, 1, 7, 999.0, 1),
        ],
    }
}

async fn read_view(
    backend: &DuckDbBackend,
    view: ReportView,
    order_by: &str,
) -> anyhow::Result<Vec<RecordBatch>> {
    let sql = format!(
        "SELECT * FROM {} ORDER BY {}",
        backend.qualify("gold", view.name()),
        order_by
    );
    Ok(backend.execute_sql(&sql).await?)
}

/// Seeds `gold.duckdb` with schema `gold`, so catalog and schema share a name.
async fn seeded(data: &GeneratedWarehouse) -> anyhow::Result<(TempDir, DuckDbBackend)> {
    let temp_dir = TempDir::new()?;
    let backend = DuckDbBackend::new(&temp_dir.path().join("gold.duckdb"), "gold").await?;
    let layout = WarehouseLayout::default();
    backend.load_warehouse(&layout.schema_config(), data).await?;
    Ok((temp_dir, backend))
}

#[tokio::test]
async fn test_native_product_report() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();

    let rows = executor::product_report(&backend, &layout, date(2024, 1, 1).unwrap()).await?;
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.product_name.as_deref(), Some("Road-150 Red"));
    assert_eq!(row.total_sales, 60100.0);
    assert_eq!(row.total_orders, 2);
    assert_eq!(row.total_customers, 2);
    assert_eq!(row.lifespan, 5);
    assert_eq!(row.recency_in_months, 7);
    assert_eq!(row.avg_order_revenue, 30050.0);
    assert_eq!(row.avg_monthly_revenue, 12020.0);
    assert_eq!(row.avg_selling_price, Some(30025.0));
    assert_eq!(row.product_segment, ProductSegment::HighPerformer);

    Ok(())
}

#[tokio::test]
async fn test_native_customer_report() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();

    let rows = executor::customer_report(&backend, &layout, date(2024, 1, 1).unwrap()).await?;
    assert_eq!(rows.len(), 2);

    // The undated line for customer 7 is excluded
    assert_eq!(rows[0].customer_key, 7);
    assert_eq!(rows[0].customer_name.as_deref(), Some("Jon Yang"));
    assert_eq!(rows[0].total_sales, 100.0);
    assert_eq!(rows[0].customer_age, Some(53));

    assert_eq!(rows[1].customer_key, 8);
    assert_eq!(rows[1].customer_age, None);
    assert_eq!(rows[1].age_segmentation.as_str(), "50 and above");

    Ok(())
}

#[tokio::test]
async fn test_report_on_empty_target_fails() -> anyhow::Result<()> {
    let backend = DuckDbBackend::in_memory("gold")?;
    let err = executor::product_report(&backend, &WarehouseLayout::default(), date(2024, 1, 1).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::ReportError { .. })
    ));
    assert!(format!("{:#}", err).contains("gold.fact_sales"));
    Ok(())
}

#[tokio::test]
async fn test_views_match_fixture() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();

    let results = executor::install_views(&backend, &layout, date(2024, 1, 1), false).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].row_count, 1);
    assert_eq!(results[1].row_count, 2);

    let batches = read_view(&backend, ReportView::Products, "product_key").await?;
    assert_eq!(column_f64(&batches, "total_sales"), vec![Some(60100.0)]);
    assert_eq!(column_i64(&batches, "lifespan"), vec![Some(5)]);
    assert_eq!(column_i64(&batches, "recency_in_months"), vec![Some(7)]);
    assert_eq!(column_f64(&batches, "avg_selling_price"), vec![Some(30025.0)]);
    assert_eq!(column_f64(&batches, "avg_monthly_revenue"), vec![Some(12020.0)]);
    assert_eq!(
        column_str(&batches, "product_segment"),
        vec![Some("High-Performer".to_string())]
    );

    let batches = read_view(&backend, ReportView::Customers, "customer_key").await?;
    assert_eq!(
        column_str(&batches, "customer_name"),
        vec![Some("Jon Yang".to_string()), Some("Eugene ".to_string())]
    );
    assert_eq!(
        column_str(&batches, "age_segmentation")[1],
        Some("50 and above".to_string())
    );
    assert_eq!(
        column_str(&batches, "customer_segmentation"),
        vec![Some("New".to_string()), Some("New".to_string())]
    );

    Ok(())
}

#[tokio::test]
async fn test_database_named_after_schema() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();
    assert_eq!(backend.catalog(), Some("gold"));

    let rows = executor::product_report(&backend, &layout, date(2024, 1, 1).unwrap()).await?;
    assert_eq!(rows.len(), 1);

    let results = executor::install_views(&backend, &layout, date(2024, 1, 1), false).await?;
    assert_eq!(results.len(), 2);

    let batches =
        executor::run_query(&backend, &layout, queries::find("tables")?, None, None).await?;
    let names = column_str(&batches, "table_name");
    assert!(names.contains(&Some("report_products".to_string())));
    assert!(names.contains(&Some("fact_sales".to_string())));

    Ok(())
}

#[tokio::test]
async fn test_views_are_idempotent() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();

    executor::install_views(&backend, &layout, date(2024, 1, 1), false).await?;
    let results = executor::install_views(&backend, &layout, date(2024, 1, 1), true).await?;

    assert!(results.iter().all(|r| r.preview.is_some()));
    for view in ReportView::ALL {
        assert!(backend.table_exists("gold", view.name()).await?);
    }
    Ok(())
}

#[tokio::test]
async fn test_views_agree_with_native_reports() -> anyhow::Result<()> {
    let data = WarehouseGenerator::new(presets::small()).generate();
    let (_dir, backend) = seeded(&data).await?;
    let layout = WarehouseLayout::default();
    let as_of = date(2014, 1, 1).unwrap();
    executor::install_views(&backend, &layout, Some(as_of), false).await?;

    let native = executor::product_report(&backend, &layout, as_of).await?;
    let batches = read_view(&backend, ReportView::Products, "product_key").await?;

    let keys = column_i64(&batches, "product_key");
    let sales = column_f64(&batches, "total_sales");
    let lifespans = column_i64(&batches, "lifespan");
    let orders = column_i64(&batches, "total_orders");
    let prices = column_f64(&batches, "avg_selling_price");
    let monthly = column_f64(&batches, "avg_monthly_revenue");
    let segments = column_str(&batches, "product_segment");
    let recency = column_i64(&batches, "recency_in_months");

    assert_eq!(keys.len(), native.len());
    for (i, row) in native.iter().enumerate() {
        assert_eq!(keys[i], Some(row.product_key));
        assert!(close(sales[i].unwrap(), row.total_sales));
        assert_eq!(lifespans[i], Some(row.lifespan as i64));
        assert_eq!(orders[i], Some(row.total_orders as i64));
        assert_eq!(prices[i], row.avg_selling_price);
        assert!(close(monthly[i].unwrap(), row.avg_monthly_revenue));
        assert_eq!(segments[i].as_deref(), Some(row.product_segment.as_str()));
        assert_eq!(recency[i], Some(row.recency_in_months as i64));
    }

    let native = executor::customer_report(&backend, &layout, as_of).await?;
    let batches = read_view(&backend, ReportView::Customers, "customer_key").await?;

    let keys = column_i64(&batches, "customer_key");
    let sales = column_f64(&batches, "total_sales");
    let products = column_i64(&batches, "total_product");
    let order_values = column_f64(&batches, "avg_order_value");
    let segments = column_str(&batches, "customer_segmentation");

    assert_eq!(keys.len(), native.len());
    for (i, row) in native.iter().enumerate() {
        assert_eq!(keys[i], Some(row.customer_key));
        assert!(close(sales[i].unwrap(), row.total_sales));
        assert_eq!(products[i], Some(row.total_product as i64));
        assert!(close(order_values[i].unwrap(), row.avg_order_value));
        assert_eq!(segments[i].as_deref(), Some(row.customer_segmentation.as_str()));
    }

    Ok(())
}

#[tokio::test]
async fn test_every_catalog_query_runs() -> anyhow::Result<()> {
    let data = WarehouseGenerator::new(presets::small()).generate();
    let (_dir, backend) = seeded(&data).await?;
    let layout = WarehouseLayout::default();

    for query in CATALOG {
        let batches = executor::run_query(&backend, &layout, query, None, date(2024, 1, 1)).await?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert!(rows > 0, "query '{}' returned no rows", query.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_key_metrics_and_rankings() -> anyhow::Result<()> {
    let (_dir, backend) = seeded(&fixture()).await?;
    let layout = WarehouseLayout::default();

    let batches =
        executor::run_query(&backend, &layout, queries::find("key_metrics")?, None, None).await?;
    let names = column_str(&batches, "measure_name");
    let values = column_f64(&batches, "measure_value");
    assert_eq!(names[0].as_deref(), Some("Total Sales"));
    // Undated lines still count toward totals
    assert_eq!(values[0], Some(61099.0));
    assert_eq!(names[3].as_deref(), Some("Total Orders"));
    assert_eq!(values[3], Some(3.0));

    let batches =
        executor::run_query(&backend, &layout, queries::find("top_customers")?, Some(1), None).await?;
    assert_eq!(column_i64(&batches, "customer_key"), vec![Some(8)]);

    let batches =
        executor::run_query(&backend, &layout, queries::find("fewest_order_customers")?, None, None)
            .await?;
    assert_eq!(column_i64(&batches, "total_orders"), vec![Some(1), Some(2)]);

    Ok(())
}

#[tokio::test]
async fn test_query_error_carries_sql() -> anyhow::Result<()> {
    let backend = DuckDbBackend::in_memory("gold")?;
    let err = executor::run_query(
        &backend,
        &WarehouseLayout::default(),
        queries::find("countries")?,
        None,
        None,
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<CliError>() {
        Some(CliError::QueryError { name, sql, .. }) => {
            assert_eq!(name, "countries");
            assert!(sql.contains("gold.dim_customers"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}
