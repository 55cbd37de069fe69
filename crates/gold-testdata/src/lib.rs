//! Deterministic Gold-layer data for tests and demos.
//!
//! Generates a small star schema (`dim_products`, `dim_customers`,
//! `fact_sales`) from a single seed, renders it as SQL, and loads it into any
//! [`gold_backend::Backend`].
//!
//! ```rust
//! use gold_testdata::{presets, WarehouseGenerator};
//!
//! let data = WarehouseGenerator::new(presets::small()).generate();
//! assert_eq!(data.products.len(), 20);
//! println!("{}", data.summary());
//! ```

pub mod builder;
pub mod config;
pub mod generator;
pub mod loader;
pub mod output;
pub mod presets;
pub mod rng;

pub use builder::TestDataBuilder;
pub use config::{DateRange, SchemaConfig, TestDataConfig};
pub use generator::{GeneratedWarehouse, WarehouseGenerator};
pub use loader::{WarehouseLoadResult, WarehouseLoader};
pub use output::SqlOutput;
pub use rng::SeededRngFactory;
