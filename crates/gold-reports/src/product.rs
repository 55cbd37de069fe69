//! Per-product lifecycle and revenue report.
//!
//! Three stages: drop undated lines and join to the product dimension,
//! fold lines into one [`ProductAggregate`] per product key, then classify
//! each aggregate into a [`ProductReportRow`] against an explicit `as_of`
//! date.

use crate::calendar::{months_between, round_to};
use crate::model::{Product, SaleLine};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Revenue above which a product is a high performer.
pub const HIGH_PERFORMER_MIN_SALES: f64 = 50_000.0;

/// Revenue at or above which a product is mid-range.
pub const MID_RANGE_MIN_SALES: f64 = 10_000.0;

/// Revenue tier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductSegment {
    HighPerformer,
    MidRange,
    LowPerformer,
}

impl ProductSegment {
    /// First matching tier wins: `> 50000`, then `>= 10000`, else low.
    pub fn classify(total_sales: f64) -> Self {
        if total_sales > HIGH_PERFORMER_MIN_SALES {
            ProductSegment::HighPerformer
        } else if total_sales >= MID_RANGE_MIN_SALES {
            ProductSegment::MidRange
        } else {
            ProductSegment::LowPerformer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSegment::HighPerformer => "High-Performer",
            ProductSegment::MidRange => "Mid-Range",
            ProductSegment::LowPerformer => "Low-Performer",
        }
    }
}

impl std::fmt::Display for ProductSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revenue per distinct order, 0 when there are no orders.
pub fn avg_order_revenue(total_sales: f64, total_orders: u64) -> f64 {
    if total_orders == 0 {
        0.0
    } else {
        total_sales / total_orders as f64
    }
}

/// Revenue per month of lifespan; the full revenue when lifespan is 0.
pub fn avg_monthly_revenue(total_sales: f64, lifespan: i32) -> f64 {
    if lifespan == 0 {
        total_sales
    } else {
        total_sales / lifespan as f64
    }
}

/// Aggregated sales of one product, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductAggregate {
    pub product_key: i64,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub cost: Option<f64>,
    pub first_sale_date: NaiveDate,
    pub last_sale_date: NaiveDate,
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_sales: f64,
    pub total_quantity: i64,
    /// Mean of `sales_amount / quantity` over lines with non-zero quantity.
    pub avg_selling_price: Option<f64>,
}

impl ProductAggregate {
    pub fn lifespan(&self) -> i32 {
        months_between(self.first_sale_date, self.last_sale_date)
    }

    /// Derive the report row. `recency_in_months` depends on `as_of`.
    pub fn into_report_row(self, as_of: NaiveDate) -> ProductReportRow {
        let lifespan = self.lifespan();

        ProductReportRow {
            product_key: self.product_key,
            product_name: self.product_name,
            category: self.category,
            sub_category: self.sub_category,
            cost: self.cost,
            last_sale_date: self.last_sale_date,
            recency_in_months: months_between(self.last_sale_date, as_of),
            product_segment: ProductSegment::classify(self.total_sales),
            lifespan,
            total_orders: self.total_orders,
            total_sales: self.total_sales,
            total_quantity: self.total_quantity,
            total_customers: self.total_customers,
            avg_selling_price: self.avg_selling_price.map(|p| round_to(p, 1)),
            avg_order_revenue: avg_order_revenue(self.total_sales, self.total_orders),
            avg_monthly_revenue: avg_monthly_revenue(self.total_sales, lifespan),
        }
    }
}

/// One row of `report_products`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductReportRow {
    pub product_key: i64,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub cost: Option<f64>,
    pub last_sale_date: NaiveDate,
    pub recency_in_months: i32,
    pub product_segment: ProductSegment,
    pub lifespan: i32,
    pub total_orders: u64,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_customers: u64,
    pub avg_selling_price: Option<f64>,
    pub avg_order_revenue: f64,
    pub avg_monthly_revenue: f64,
}

struct Accumulator<'a> {
    first_sale: NaiveDate,
    last_sale: NaiveDate,
    orders: HashSet<&'a str>,
    customers: HashSet<i64>,
    total_sales: f64,
    total_quantity: i64,
    unit_price_sum: f64,
    unit_price_count: u64,
}

impl<'a> Accumulator<'a> {
    fn new(order_date: NaiveDate) -> Self {
        Self {
            first_sale: order_date,
            last_sale: order_date,
            orders: HashSet::new(),
            customers: HashSet::new(),
            total_sales: 0.0,
            total_quantity: 0,
            unit_price_sum: 0.0,
            unit_price_count: 0,
        }
    }

    fn add(&mut self, line: &'a SaleLine, order_date: NaiveDate) {
        self.first_sale = self.first_sale.min(order_date);
        self.last_sale = self.last_sale.max(order_date);
        self.orders.insert(line.order_number.as_str());
        self.customers.insert(line.customer_key);
        self.total_sales += line.sales_amount;
        self.total_quantity += line.quantity;

        if line.quantity != 0 {
            self.unit_price_sum += line.sales_amount / line.quantity as f64;
            self.unit_price_count += 1;
        }
    }
}

/// Fold dated sale lines into one aggregate per product, ordered by key.
///
/// Lines whose product is missing from `products` still aggregate under
/// their own key, with empty dimension attributes.
pub fn aggregate_products(lines: &[SaleLine], products: &[Product]) -> Vec<ProductAggregate> {
    let dimension: HashMap<i64, &Product> =
        products.iter().map(|p| (p.product_key, p)).collect();

    let mut groups: BTreeMap<i64, Accumulator<'_>> = BTreeMap::new();
    let mut undated = 0usize;

    for line in lines {
        let Some(order_date) = line.order_date else {
            undated += 1;
            continue;
        };

        groups
            .entry(line.product_key)
            .or_insert_with(|| Accumulator::new(order_date))
            .add(line, order_date);
    }

    if undated > 0 {
        tracing::debug!(undated, "Skipped sale lines without an order date");
    }

    let orphans: Vec<i64> = groups
        .keys()
        .filter(|key| !dimension.contains_key(key))
        .copied()
        .collect();
    if !orphans.is_empty() {
        tracing::warn!(?orphans, "Sales reference products missing from dim_products");
    }

    groups
        .into_iter()
        .map(|(product_key, acc)| {
            let product = dimension.get(&product_key);
            let avg_selling_price = (acc.unit_price_count > 0)
                .then(|| acc.unit_price_sum / acc.unit_price_count as f64);

            ProductAggregate {
                product_key,
                product_name: product.map(|p| p.product_name.clone()),
                category: product.and_then(|p| p.category.clone()),
                sub_category: product.and_then(|p| p.sub_category.clone()),
                cost: product.and_then(|p| p.cost),
                first_sale_date: acc.first_sale,
                last_sale_date: acc.last_sale,
                total_orders: acc.orders.len() as u64,
                total_customers: acc.customers.len() as u64,
                total_sales: acc.total_sales,
                total_quantity: acc.total_quantity,
                avg_selling_price,
            }
        })
        .collect()
}

/// Compute `report_products` as of the given date.
pub fn build_product_report(
    lines: &[SaleLine],
    products: &[Product],
    as_of: NaiveDate,
) -> Vec<ProductReportRow> {
    aggregate_products(lines, products)
        .into_iter()
        .map(|aggregate| aggregate.into_report_row(as_of))
        .collect()
}
