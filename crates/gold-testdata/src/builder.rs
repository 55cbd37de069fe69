//! Fluent builder for TestDataConfig.

use crate::config::{DateRange, SchemaConfig, TestDataConfig};
use chrono::NaiveDate;

/// Fluent builder for TestDataConfig.
///
/// # Example
/// ```
/// use gold_testdata::TestDataBuilder;
///
/// let config = TestDataBuilder::new()
///     .seed(7)
///     .products(20)
///     .customers(100)
///     .orders(300)
///     .build();
/// assert_eq!(config.customers, 100);
/// ```
pub struct TestDataBuilder {
    config: TestDataConfig,
}

impl TestDataBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: TestDataConfig::default(),
        }
    }

    /// Set the master seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Spread orders over an explicit date range.
    pub fn order_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.config.order_range = DateRange::new(start, end);
        self
    }

    pub fn products(mut self, count: usize) -> Self {
        self.config.products = count;
        self
    }

    pub fn customers(mut self, count: usize) -> Self {
        self.config.customers = count;
        self
    }

    pub fn orders(mut self, count: usize) -> Self {
        self.config.orders = count;
        self
    }

    /// Cap the number of line items per order; values below 1 become 1.
    pub fn max_lines_per_order(mut self, max: usize) -> Self {
        self.config.max_lines_per_order = max.max(1);
        self
    }

    /// Fraction of sale lines left without an order date, clamped to `[0, 1]`.
    pub fn undated_share(mut self, share: f64) -> Self {
        self.config.undated_share = share.clamp(0.0, 1.0);
        self
    }

    /// Fraction of customers left without a birthdate, clamped to `[0, 1]`.
    pub fn missing_birthdate_share(mut self, share: f64) -> Self {
        self.config.missing_birthdate_share = share.clamp(0.0, 1.0);
        self
    }

    /// Set the database schema name.
    pub fn db_schema(mut self, schema: &str) -> Self {
        self.config.schema.db_schema = schema.to_string();
        self
    }

    /// Set the full schema configuration.
    pub fn schema_config(mut self, config: SchemaConfig) -> Self {
        self.config.schema = config;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TestDataConfig {
        self.config
    }
}

impl Default for TestDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = TestDataBuilder::new().build();
        assert_eq!(config.seed, 42);
        assert_eq!(config.products, 60);
    }

    #[test]
    fn test_builder_clamps() {
        let config = TestDataBuilder::new()
            .max_lines_per_order(0)
            .undated_share(3.0)
            .missing_birthdate_share(-1.0)
            .build();

        assert_eq!(config.max_lines_per_order, 1);
        assert_eq!(config.undated_share, 1.0);
        assert_eq!(config.missing_birthdate_share, 0.0);
    }

    #[test]
    fn test_builder_chaining() {
        let config = TestDataBuilder::new()
            .seed(99)
            .customers(25)
            .orders(80)
            .db_schema("analytics")
            .build();

        assert_eq!(config.seed, 99);
        assert_eq!(config.customers, 25);
        assert_eq!(config.orders, 80);
        assert_eq!(config.schema.db_schema, "analytics");
    }
}
