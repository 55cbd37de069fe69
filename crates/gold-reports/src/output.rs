//! Arrow RecordBatch output for report rows.

use crate::customer::CustomerReportRow;
use crate::error::ReportError;
use crate::product::ProductReportRow;
use arrow::array::{
    ArrayRef, Date32Array, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use chrono::NaiveDate;
use std::sync::Arc;

fn epoch_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

/// Schema of `report_products`.
pub fn product_report_schema() -> Schema {
    Schema::new(vec![
        Field::new("product_key", DataType::Int64, false),
        Field::new("product_name", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, true),
        Field::new("sub_category", DataType::Utf8, true),
        Field::new("cost", DataType::Float64, true),
        Field::new("last_sale_date", DataType::Date32, false),
        Field::new("recency_in_months", DataType::Int32, false),
        Field::new("product_segment", DataType::Utf8, false),
        Field::new("lifespan", DataType::Int32, false),
        Field::new("total_orders", DataType::Int64, false),
        Field::new("total_sales", DataType::Float64, false),
        Field::new("total_quantity", DataType::Int64, false),
        Field::new("total_customers", DataType::Int64, false),
        Field::new("avg_selling_price", DataType::Float64, true),
        Field::new("avg_order_revenue", DataType::Float64, false),
        Field::new("avg_monthly_revenue", DataType::Float64, false),
    ])
}

/// Schema of `report_customers`.
pub fn customer_report_schema() -> Schema {
    Schema::new(vec![
        Field::new("customer_key", DataType::Int64, false),
        Field::new("customer_number", DataType::Utf8, true),
        Field::new("customer_name", DataType::Utf8, true),
        Field::new("customer_age", DataType::Int32, true),
        Field::new("age_segmentation", DataType::Utf8, false),
        Field::new("customer_segmentation", DataType::Utf8, false),
        Field::new("last_order", DataType::Date32, false),
        Field::new("recency_in_month", DataType::Int32, false),
        Field::new("total_order_num", DataType::Int64, false),
        Field::new("total_sales", DataType::Float64, false),
        Field::new("total_quantity", DataType::Int64, false),
        Field::new("total_product", DataType::Int64, false),
        Field::new("lifespan", DataType::Int32, false),
        Field::new("avg_order_value", DataType::Float64, false),
        Field::new("avg_monthly_spending", DataType::Float64, false),
    ])
}

/// Convert product report rows to a single RecordBatch.
pub fn product_report_batch(rows: &[ProductReportRow]) -> Result<RecordBatch, ReportError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.product_key))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.product_name.as_deref()))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.category.as_deref()))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.sub_category.as_deref()))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.cost))),
        Arc::new(Date32Array::from_iter_values(
            rows.iter().map(|r| epoch_days(r.last_sale_date)),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.recency_in_months))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.product_segment.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.lifespan))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_orders as i64))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_sales))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_quantity))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_customers as i64))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.avg_selling_price))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.avg_order_revenue))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.avg_monthly_revenue))),
    ];

    RecordBatch::try_new(Arc::new(product_report_schema()), columns).map_err(|source| {
        ReportError::Encode {
            report: "report_products".to_string(),
            source,
        }
    })
}

/// Convert customer report rows to a single RecordBatch.
pub fn customer_report_batch(rows: &[CustomerReportRow]) -> Result<RecordBatch, ReportError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.customer_key))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.customer_number.as_deref()))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.customer_name.as_deref()))),
        Arc::new(Int32Array::from_iter(rows.iter().map(|r| r.customer_age))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.age_segmentation.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.customer_segmentation.as_str()),
        )),
        Arc::new(Date32Array::from_iter_values(rows.iter().map(|r| epoch_days(r.last_order)))),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.recency_in_month))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_order_num as i64))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_sales))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_quantity))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_product as i64))),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.lifespan))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.avg_order_value))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.avg_monthly_spending))),
    ];

    RecordBatch::try_new(Arc::new(customer_report_schema()), columns).map_err(|source| {
        ReportError::Encode {
            report: "report_customers".to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::build_customer_report;
    use crate::model::SaleLine;
    use crate::product::build_product_report;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Date32Type;

    fn lines() -> Vec<SaleLine> {
        vec![
            SaleLine::new("SO1", NaiveDate::from_ymd_opt(2023, 1, 10), 1, 10, 100.0, 2),
            SaleLine::new("SO2", NaiveDate::from_ymd_opt(2023, 6, 10), 1, 11, 60000.0, 1),
            SaleLine::new("SO3", NaiveDate::from_ymd_opt(2023, 6, 11), 2, 10, 0.0, 0),
        ]
    }

    #[test]
    fn test_product_batch_shape() {
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = build_product_report(&lines(), &[], as_of);
        let batch = product_report_batch(&rows).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 16);

        let segment = batch.column_by_name("product_segment").unwrap().as_string::<i32>();
        assert_eq!(segment.value(0), "High-Performer");
        assert_eq!(segment.value(1), "Low-Performer");

        let avg_price = batch.column_by_name("avg_selling_price").unwrap();
        assert!(avg_price.is_null(1));

        let last_sale = batch
            .column_by_name("last_sale_date")
            .unwrap()
            .as_primitive::<Date32Type>();
        assert_eq!(last_sale.value_as_date(0), NaiveDate::from_ymd_opt(2023, 6, 10));
    }

    #[test]
    fn test_customer_batch_shape() {
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = build_customer_report(&lines(), &[], as_of);
        let batch = customer_report_batch(&rows).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 15);
        assert_eq!(batch.schema().field(4).name(), "age_segmentation");

        let age = batch.column_by_name("customer_age").unwrap();
        assert!(age.is_null(0));
    }

    #[test]
    fn test_empty_report_batch() {
        let batch = product_report_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 16);
    }
}
