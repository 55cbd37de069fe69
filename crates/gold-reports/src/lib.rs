//! Product and customer reports over a Gold-layer star schema.
//!
//! The warehouse publishes one fact relation (`fact_sales`) and two
//! dimensions (`dim_products`, `dim_customers`). This crate turns them into
//! the two consolidated report relations, `report_products` and
//! `report_customers`, as pure functions:
//!
//! 1. drop sale lines without an order date and join them to a dimension,
//! 2. fold the lines into one aggregate per product or customer,
//! 3. classify each aggregate into a report row.
//!
//! Recency and age depend on the evaluation date, which every entry point
//! takes as an explicit `as_of` argument; nothing here reads the clock.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use gold_reports::{build_product_report, ProductSegment, SaleLine};
//!
//! let lines = vec![
//!     SaleLine::new("A", NaiveDate::from_ymd_opt(2023, 1, 10), 1, 7, 100.0, 2),
//!     SaleLine::new("B", NaiveDate::from_ymd_opt(2023, 6, 10), 1, 8, 60000.0, 1),
//! ];
//! let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!
//! let report = build_product_report(&lines, &[], as_of);
//! assert_eq!(report[0].lifespan, 5);
//! assert_eq!(report[0].product_segment, ProductSegment::HighPerformer);
//! assert_eq!(report[0].avg_monthly_revenue, 12020.0);
//! ```

pub mod calendar;
pub mod customer;
pub mod error;
pub mod model;
pub mod output;
pub mod product;
pub mod source;

pub use customer::{
    aggregate_customers, build_customer_report, AgeSegment, CustomerAggregate,
    CustomerReportRow, CustomerSegment,
};
pub use error::ReportError;
pub use model::{Customer, Product, SaleLine};
pub use output::{customer_report_batch, product_report_batch};
pub use product::{
    aggregate_products, build_product_report, ProductAggregate, ProductReportRow, ProductSegment,
};
pub use source::{decode_customers, decode_products, decode_sale_lines};
