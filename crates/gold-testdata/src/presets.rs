//! Pre-configured warehouse sizes.

use crate::builder::TestDataBuilder;
use crate::config::TestDataConfig;

/// Small warehouse for unit and integration tests.
///
/// - 20 products
/// - 50 customers
/// - 200 orders
pub fn small() -> TestDataConfig {
    TestDataBuilder::new()
        .seed(42)
        .products(20)
        .customers(50)
        .orders(200)
        .build()
}

/// Medium warehouse for demos.
///
/// - 150 products
/// - 2,000 customers
/// - 25,000 orders over three years
pub fn medium() -> TestDataConfig {
    TestDataBuilder::new()
        .seed(42)
        .products(150)
        .customers(2_000)
        .orders(25_000)
        .build()
}

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<TestDataConfig> {
    match name.to_lowercase().as_str() {
        "small" => Some(small()),
        "medium" => Some(medium()),
        _ => None,
    }
}
