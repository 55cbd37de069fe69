//! Per-customer lifecycle and spend report.

use crate::calendar::{months_between, years_between};
use crate::model::{Customer, SaleLine};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Minimum lifespan, in months, for a customer to leave the `New` segment.
pub const ESTABLISHED_MIN_LIFESPAN: i32 = 12;

/// Spend above which an established customer is a VIP.
pub const VIP_MIN_SALES: f64 = 5_000.0;

/// Age bracket of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeSegment {
    Under20,
    From20To29,
    From30To39,
    From40To49,
    FiftyAndAbove,
}

impl AgeSegment {
    /// Lowest matching bracket wins.
    ///
    /// An unknown age falls through every bracket into `50 and above`, the
    /// same place a `CASE ... ELSE` puts a NULL age.
    pub fn from_age(age: Option<i32>) -> Self {
        match age {
            Some(age) if age < 20 => AgeSegment::Under20,
            Some(age) if age < 30 => AgeSegment::From20To29,
            Some(age) if age < 40 => AgeSegment::From30To39,
            Some(age) if age < 50 => AgeSegment::From40To49,
            _ => AgeSegment::FiftyAndAbove,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeSegment::Under20 => "Under 20",
            AgeSegment::From20To29 => "20-29",
            AgeSegment::From30To39 => "30-39",
            AgeSegment::From40To49 => "40-49",
            AgeSegment::FiftyAndAbove => "50 and above",
        }
    }
}

impl std::fmt::Display for AgeSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value segment of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerSegment {
    Vip,
    Regular,
    New,
}

impl CustomerSegment {
    pub fn classify(lifespan: i32, total_sales: f64) -> Self {
        if lifespan >= ESTABLISHED_MIN_LIFESPAN && total_sales > VIP_MIN_SALES {
            CustomerSegment::Vip
        } else if lifespan >= ESTABLISHED_MIN_LIFESPAN {
            CustomerSegment::Regular
        } else {
            CustomerSegment::New
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::Vip => "VIP",
            CustomerSegment::Regular => "Regular",
            CustomerSegment::New => "New",
        }
    }
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spend per distinct order.
///
/// Zero spend short-circuits to 0 before the division. Zero orders also
/// yield 0 rather than an infinite value.
pub fn avg_order_value(total_sales: f64, total_order_num: u64) -> f64 {
    if total_sales == 0.0 || total_order_num == 0 {
        0.0
    } else {
        total_sales / total_order_num as f64
    }
}

/// Spend per month of lifespan; the full spend when lifespan is 0.
pub fn avg_monthly_spending(total_sales: f64, lifespan: i32) -> f64 {
    if lifespan == 0 {
        total_sales
    } else {
        total_sales / lifespan as f64
    }
}

/// Aggregated purchases of one customer, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub customer_key: i64,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub first_order: NaiveDate,
    pub last_order: NaiveDate,
    pub total_order_num: u64,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_product: u64,
}

impl CustomerAggregate {
    pub fn lifespan(&self) -> i32 {
        months_between(self.first_order, self.last_order)
    }

    /// Derive the report row. Age and recency depend on `as_of`.
    pub fn into_report_row(self, as_of: NaiveDate) -> CustomerReportRow {
        let lifespan = self.lifespan();
        let customer_age = self.birthdate.map(|b| years_between(b, as_of));

        CustomerReportRow {
            customer_key: self.customer_key,
            customer_number: self.customer_number,
            customer_name: self.customer_name,
            customer_age,
            age_segmentation: AgeSegment::from_age(customer_age),
            customer_segmentation: CustomerSegment::classify(lifespan, self.total_sales),
            last_order: self.last_order,
            recency_in_month: months_between(self.last_order, as_of),
            total_order_num: self.total_order_num,
            total_sales: self.total_sales,
            total_quantity: self.total_quantity,
            total_product: self.total_product,
            lifespan,
            avg_order_value: avg_order_value(self.total_sales, self.total_order_num),
            avg_monthly_spending: avg_monthly_spending(self.total_sales, lifespan),
        }
    }
}

/// One row of `report_customers`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerReportRow {
    pub customer_key: i64,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_age: Option<i32>,
    pub age_segmentation: AgeSegment,
    pub customer_segmentation: CustomerSegment,
    pub last_order: NaiveDate,
    pub recency_in_month: i32,
    pub total_order_num: u64,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_product: u64,
    pub lifespan: i32,
    pub avg_order_value: f64,
    pub avg_monthly_spending: f64,
}

struct Accumulator<'a> {
    first_order: NaiveDate,
    last_order: NaiveDate,
    orders: HashSet<&'a str>,
    products: HashSet<i64>,
    total_sales: f64,
    total_quantity: i64,
}

/// Fold dated sale lines into one aggregate per customer, ordered by key.
pub fn aggregate_customers(lines: &[SaleLine], customers: &[Customer]) -> Vec<CustomerAggregate> {
    let dimension: HashMap<i64, &Customer> =
        customers.iter().map(|c| (c.customer_key, c)).collect();

    let mut groups: BTreeMap<i64, Accumulator<'_>> = BTreeMap::new();

    for line in lines {
        let Some(order_date) = line.order_date else {
            continue;
        };

        let acc = groups.entry(line.customer_key).or_insert_with(|| Accumulator {
            first_order: order_date,
            last_order: order_date,
            orders: HashSet::new(),
            products: HashSet::new(),
            total_sales: 0.0,
            total_quantity: 0,
        });

        acc.first_order = acc.first_order.min(order_date);
        acc.last_order = acc.last_order.max(order_date);
        acc.orders.insert(line.order_number.as_str());
        acc.products.insert(line.product_key);
        acc.total_sales += line.sales_amount;
        acc.total_quantity += line.quantity;
    }

    let orphans = groups.keys().filter(|k| !dimension.contains_key(k)).count();
    if orphans > 0 {
        tracing::warn!(orphans, "Sales reference customers missing from dim_customers");
    }

    groups
        .into_iter()
        .map(|(customer_key, acc)| {
            let customer = dimension.get(&customer_key);

            CustomerAggregate {
                customer_key,
                customer_number: customer.map(|c| c.customer_number.clone()),
                customer_name: customer.map(|c| c.full_name()),
                birthdate: customer.and_then(|c| c.birthdate),
                first_order: acc.first_order,
                last_order: acc.last_order,
                total_order_num: acc.orders.len() as u64,
                total_sales: acc.total_sales,
                total_quantity: acc.total_quantity,
                total_product: acc.products.len() as u64,
            }
        })
        .collect()
}

/// Compute `report_customers` as of the given date.
pub fn build_customer_report(
    lines: &[SaleLine],
    customers: &[Customer],
    as_of: NaiveDate,
) -> Vec<CustomerReportRow> {
    aggregate_customers(lines, customers)
        .into_iter()
        .map(|aggregate| aggregate.into_report_row(as_of))
        .collect()
}
