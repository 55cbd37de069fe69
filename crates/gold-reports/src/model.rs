//! Row types for the Gold-layer star schema.
//!
//! These mirror the three relations the upstream ETL publishes. They are
//! read-only from this crate's point of view.

use chrono::NaiveDate;

/// One sold line item from `fact_sales`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    /// Order identifier; several lines may share one order.
    pub order_number: String,

    /// Lines without an order date never reach a report.
    pub order_date: Option<NaiveDate>,

    /// Foreign key into `dim_products`.
    pub product_key: i64,

    /// Foreign key into `dim_customers`.
    pub customer_key: i64,

    /// Expected to equal `price * quantity`.
    pub sales_amount: f64,

    pub quantity: i64,

    pub price: f64,
}

impl SaleLine {
    /// Create a line with `price` derived from amount and quantity.
    pub fn new(
        order_number: impl Into<String>,
        order_date: Option<NaiveDate>,
        product_key: i64,
        customer_key: i64,
        sales_amount: f64,
        quantity: i64,
    ) -> Self {
        let price = if quantity == 0 {
            0.0
        } else {
            sales_amount / quantity as f64
        };

        Self {
            order_number: order_number.into(),
            order_date,
            product_key,
            customer_key,
            sales_amount,
            quantity,
            price,
        }
    }
}

/// One product from `dim_products`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_key: i64,
    pub product_name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub cost: Option<f64>,
}

/// One customer from `dim_customers`.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub customer_key: i64,
    pub customer_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
}

impl Customer {
    /// First and last name joined by a space; missing parts count as empty.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_line_price() {
        let line = SaleLine::new("SO1", None, 1, 1, 90.0, 3);
        assert_eq!(line.price, 30.0);

        let zero = SaleLine::new("SO2", None, 1, 1, 90.0, 0);
        assert_eq!(zero.price, 0.0);
    }

    #[test]
    fn test_full_name_with_missing_parts() {
        let customer = Customer {
            customer_key: 1,
            customer_number: "AW00011000".to_string(),
            first_name: Some("Jon".to_string()),
            last_name: None,
            birthdate: None,
            gender: None,
            country: None,
        };
        assert_eq!(customer.full_name(), "Jon ");
    }
}
