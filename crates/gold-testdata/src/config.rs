//! Configuration structures for warehouse generation.

use chrono::NaiveDate;

/// Top-level configuration for a synthetic Gold layer.
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Master seed for reproducibility
    pub seed: u64,

    /// Date range orders are spread over
    pub order_range: DateRange,

    /// Number of rows in `dim_products`
    pub products: usize,

    /// Number of rows in `dim_customers`
    pub customers: usize,

    /// Number of distinct orders in `fact_sales`
    pub orders: usize,

    /// Maximum line items per order (at least 1)
    pub max_lines_per_order: usize,

    /// Share of sale lines written without an order date
    pub undated_share: f64,

    /// Share of customers written without a birthdate
    pub missing_birthdate_share: f64,

    /// Schema settings (table names)
    pub schema: SchemaConfig,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            order_range: DateRange::default(),
            products: 60,
            customers: 500,
            orders: 2_000,
            max_lines_per_order: 4,
            undated_share: 0.01,
            missing_birthdate_share: 0.02,
            schema: SchemaConfig::default(),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; the bounds are swapped if given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Number of days covered, counting both ends.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl Default for DateRange {
    /// Three full calendar years, 2011 through 2013.
    fn default() -> Self {
        Self::new(
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap_or_default(),
            NaiveDate::from_ymd_opt(2013, 12, 31).unwrap_or_default(),
        )
    }
}

/// Where the generated relations are written.
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Database schema name
    pub db_schema: String,
    pub fact_sales: String,
    pub dim_products: String,
    pub dim_customers: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            db_schema: "gold".to_string(),
            fact_sales: "fact_sales".to_string(),
            dim_products: "dim_products".to_string(),
            dim_customers: "dim_customers".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_is_three_years() {
        let range = DateRange::default();
        assert_eq!(range.num_days(), 365 * 3 + 1);
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let a = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let range = DateRange::new(a, b);
        assert_eq!(range.start, b);
        assert_eq!(range.end, a);
    }

    #[test]
    fn test_default_config() {
        let config = TestDataConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.schema.db_schema, "gold");
        assert!(config.max_lines_per_order >= 1);
    }
}
