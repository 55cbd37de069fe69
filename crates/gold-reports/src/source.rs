//! Decoding of the Gold-layer relations from Arrow record batches.
//!
//! Every column is cast to the type this crate works with before it is read,
//! so engines that hand back `INTEGER`, `DECIMAL` or view-encoded strings
//! decode the same way as ones that return `BIGINT`/`DOUBLE`/`VARCHAR`.

use crate::error::ReportError;
use crate::model::{Customer, Product, SaleLine};
use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use chrono::NaiveDate;

pub const FACT_SALES: &str = "fact_sales";
pub const DIM_PRODUCTS: &str = "dim_products";
pub const DIM_CUSTOMERS: &str = "dim_customers";

fn optional_column(
    batch: &RecordBatch,
    relation: &str,
    name: &str,
    data_type: &DataType,
) -> Result<Option<ArrayRef>, ReportError> {
    let Some(array) = batch.column_by_name(name) else {
        return Ok(None);
    };

    cast(array, data_type)
        .map(Some)
        .map_err(|source| ReportError::Decode {
            relation: relation.to_string(),
            column: name.to_string(),
            expected: data_type.to_string(),
            source,
        })
}

fn required_column(
    batch: &RecordBatch,
    relation: &str,
    name: &str,
    data_type: &DataType,
) -> Result<ArrayRef, ReportError> {
    optional_column(batch, relation, name, data_type)?
        .ok_or_else(|| ReportError::missing_column(relation, name))
}

fn i64_at(array: &ArrayRef, row: usize) -> Option<i64> {
    let values = array.as_primitive::<Int64Type>();
    values.is_valid(row).then(|| values.value(row))
}

fn f64_at(array: &ArrayRef, row: usize) -> Option<f64> {
    let values = array.as_primitive::<Float64Type>();
    values.is_valid(row).then(|| values.value(row))
}

fn string_at(array: &ArrayRef, row: usize) -> Option<String> {
    let values = array.as_string::<i32>();
    values.is_valid(row).then(|| values.value(row).to_string())
}

fn date_at(array: &ArrayRef, row: usize) -> Option<NaiveDate> {
    let values = array.as_primitive::<Date32Type>();
    if values.is_valid(row) {
        values.value_as_date(row)
    } else {
        None
    }
}

fn optional_string(array: Option<&ArrayRef>, row: usize) -> Option<String> {
    array.and_then(|a| string_at(a, row))
}

fn require<T>(value: Option<T>, relation: &str, column: &str, row: usize) -> Result<T, ReportError> {
    value.ok_or_else(|| ReportError::null_value(relation, column, row))
}

/// Decode `fact_sales` rows.
///
/// `order_date` may be NULL. A NULL amount or quantity reads as 0. When the
/// relation has no `price` column the price is derived from amount and
/// quantity.
pub fn decode_sale_lines(batches: &[RecordBatch]) -> Result<Vec<SaleLine>, ReportError> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for batch in batches {
        let order_number = required_column(batch, FACT_SALES, "order_number", &DataType::Utf8)?;
        let order_date = required_column(batch, FACT_SALES, "order_date", &DataType::Date32)?;
        let product_key = required_column(batch, FACT_SALES, "product_key", &DataType::Int64)?;
        let customer_key = required_column(batch, FACT_SALES, "customer_key", &DataType::Int64)?;
        let sales_amount = required_column(batch, FACT_SALES, "sales_amount", &DataType::Float64)?;
        let quantity = required_column(batch, FACT_SALES, "quantity", &DataType::Int64)?;
        let price = optional_column(batch, FACT_SALES, "price", &DataType::Float64)?;

        for row in 0..batch.num_rows() {
            let at = offset + row;
            let mut line = SaleLine::new(
                require(string_at(&order_number, row), FACT_SALES, "order_number", at)?,
                date_at(&order_date, row),
                require(i64_at(&product_key, row), FACT_SALES, "product_key", at)?,
                require(i64_at(&customer_key, row), FACT_SALES, "customer_key", at)?,
                f64_at(&sales_amount, row).unwrap_or_default(),
                i64_at(&quantity, row).unwrap_or_default(),
            );

            if let Some(price) = price.as_ref().and_then(|p| f64_at(p, row)) {
                line.price = price;
            }

            lines.push(line);
        }

        offset += batch.num_rows();
    }

    Ok(lines)
}

/// Decode `dim_products` rows.
pub fn decode_products(batches: &[RecordBatch]) -> Result<Vec<Product>, ReportError> {
    let mut products = Vec::new();
    let mut offset = 0;

    for batch in batches {
        let product_key = required_column(batch, DIM_PRODUCTS, "product_key", &DataType::Int64)?;
        let product_name = required_column(batch, DIM_PRODUCTS, "product_name", &DataType::Utf8)?;
        let category = optional_column(batch, DIM_PRODUCTS, "category", &DataType::Utf8)?;
        let sub_category = optional_column(batch, DIM_PRODUCTS, "sub_category", &DataType::Utf8)?;
        let cost = optional_column(batch, DIM_PRODUCTS, "cost", &DataType::Float64)?;

        for row in 0..batch.num_rows() {
            let at = offset + row;
            products.push(Product {
                product_key: require(i64_at(&product_key, row), DIM_PRODUCTS, "product_key", at)?,
                product_name: string_at(&product_name, row).unwrap_or_default(),
                category: optional_string(category.as_ref(), row),
                sub_category: optional_string(sub_category.as_ref(), row),
                cost: cost.as_ref().and_then(|c| f64_at(c, row)),
            });
        }

        offset += batch.num_rows();
    }

    Ok(products)
}

/// Decode `dim_customers` rows.
pub fn decode_customers(batches: &[RecordBatch]) -> Result<Vec<Customer>, ReportError> {
    let mut customers = Vec::new();
    let mut offset = 0;

    for batch in batches {
        let customer_key = required_column(batch, DIM_CUSTOMERS, "customer_key", &DataType::Int64)?;
        let customer_number =
            required_column(batch, DIM_CUSTOMERS, "customer_number", &DataType::Utf8)?;
        let first_name = optional_column(batch, DIM_CUSTOMERS, "first_name", &DataType::Utf8)?;
        let last_name = optional_column(batch, DIM_CUSTOMERS, "last_name", &DataType::Utf8)?;
        let birthdate = optional_column(batch, DIM_CUSTOMERS, "birthdate", &DataType::Date32)?;
        let gender = optional_column(batch, DIM_CUSTOMERS, "gender", &DataType::Utf8)?;
        let country = optional_column(batch, DIM_CUSTOMERS, "country", &DataType::Utf8)?;

        for row in 0..batch.num_rows() {
            let at = offset + row;
            customers.push(Customer {
                customer_key: require(i64_at(&customer_key, row), DIM_CUSTOMERS, "customer_key", at)?,
                customer_number: string_at(&customer_number, row).unwrap_or_default(),
                first_name: optional_string(first_name.as_ref(), row),
                last_name: optional_string(last_name.as_ref(), row),
                birthdate: birthdate.as_ref().and_then(|b| date_at(b, row)),
                gender: optional_string(gender.as_ref(), row),
                country: optional_string(country.as_ref(), row),
            });
        }

        offset += batch.num_rows();
    }

    Ok(customers)
}
