//! Synthetic Gold-layer generator.

use crate::config::TestDataConfig;
use crate::rng::SeededRngFactory;
use chrono::{Duration, NaiveDate};
use gold_reports::{Customer, Product, SaleLine};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;

/// Category and its sub-categories, with a typical unit cost.
const CATALOG: &[(&str, &[&str], f64)] = &[
    ("Bikes", &["Road Bikes", "Mountain Bikes", "Touring Bikes"], 900.0),
    ("Components", &["Frames", "Wheels", "Handlebars", "Brakes"], 180.0),
    ("Clothing", &["Jerseys", "Caps", "Gloves", "Socks"], 20.0),
    ("Accessories", &["Helmets", "Bottles and Cages", "Tires and Tubes"], 12.0),
];

const FIRST_NAMES: &[&str] = &[
    "Jon", "Eugene", "Ruben", "Christy", "Elizabeth", "Julio", "Janet", "Marco", "Rob", "Shannon",
    "Jacquelyn", "Curtis", "Lauren", "Ian", "Sydney", "Chloe", "Wyatt", "Shannon", "Clarence",
];

const LAST_NAMES: &[&str] = &[
    "Yang", "Huang", "Torres", "Zhu", "Johnson", "Ruiz", "Alvarez", "Mehta", "Verhoff", "Carlson",
    "Suarez", "Lu", "Walker", "Jenkins", "Bennett", "Young", "Hill", "Wang",
];

const COUNTRIES: &[&str] = &[
    "United States",
    "Australia",
    "United Kingdom",
    "Germany",
    "France",
    "Canada",
];

/// A complete generated warehouse.
#[derive(Debug, Clone)]
pub struct GeneratedWarehouse {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sales: Vec<SaleLine>,
}

impl GeneratedWarehouse {
    pub fn summary(&self) -> String {
        format!(
            "Generated {} products, {} customers, {} sale lines",
            self.products.len(),
            self.customers.len(),
            self.sales.len()
        )
    }
}

/// Deterministic generator for the three Gold relations.
pub struct WarehouseGenerator {
    config: TestDataConfig,
    rng_factory: SeededRngFactory,
}

impl WarehouseGenerator {
    pub fn new(config: TestDataConfig) -> Self {
        let rng_factory = SeededRngFactory::new(config.seed);
        Self {
            config,
            rng_factory,
        }
    }

    pub fn config(&self) -> &TestDataConfig {
        &self.config
    }

    /// Generate all relations.
    pub fn generate(&self) -> GeneratedWarehouse {
        let products = self.generate_products();
        let customers = self.generate_customers();
        let sales = self.generate_sales(&products, &customers);

        let data = GeneratedWarehouse {
            products,
            customers,
            sales,
        };
        tracing::info!(seed = self.config.seed, "{}", data.summary());
        data
    }

    /// Products with keys `1..=n`, costs log-normal around their category's typical cost.
    pub fn generate_products(&self) -> Vec<Product> {
        let mut rng = self.rng_factory.stream("products");

        (0..self.config.products)
            .map(|i| {
                let (category, sub_categories, typical_cost) = CATALOG[i % CATALOG.len()];
                let sub_category = sub_categories
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(category);
                let z: f64 = rng.sample(StandardNormal);
                let cost = (typical_cost * (0.5 * z).exp()).round().max(1.0);

                Product {
                    product_key: i as i64 + 1,
                    product_name: format!("{}-{:03}", sub_category, i + 1),
                    category: Some(category.to_string()),
                    sub_category: Some(sub_category.to_string()),
                    cost: Some(cost),
                }
            })
            .collect()
    }

    /// Customers with keys `1..=n` and ages between roughly 18 and 85.
    pub fn generate_customers(&self) -> Vec<Customer> {
        let mut rng = self.rng_factory.stream("customers");
        let birth_start = NaiveDate::from_ymd_opt(1940, 1, 1).unwrap_or_default();
        let birth_span_days = 365 * 65;

        (0..self.config.customers)
            .map(|i| {
                let birthdate = (!rng.gen_bool(self.config.missing_birthdate_share))
                    .then(|| birth_start + Duration::days(rng.gen_range(0..birth_span_days)));

                Customer {
                    customer_key: i as i64 + 1,
                    customer_number: format!("AW{:08}", 11_000 + i),
                    first_name: FIRST_NAMES.choose(&mut rng).map(|s| s.to_string()),
                    last_name: LAST_NAMES.choose(&mut rng).map(|s| s.to_string()),
                    birthdate,
                    gender: Some(if rng.gen_bool(0.5) { "Male" } else { "Female" }.to_string()),
                    country: COUNTRIES.choose(&mut rng).map(|s| s.to_string()),
                }
            })
            .collect()
    }

    /// Orders spread uniformly over the configured range.
    ///
    /// Each order belongs to one customer and holds 1..=max distinct
    /// products. Unit price is the product cost with a markup, and
    /// `sales_amount` is always `price * quantity`.
    pub fn generate_sales(&self, products: &[Product], customers: &[Customer]) -> Vec<SaleLine> {
        if products.is_empty() || customers.is_empty() {
            return Vec::new();
        }

        let mut rng = self.rng_factory.stream("sales");
        let range = self.config.order_range;
        let mut sales = Vec::new();

        for order in 0..self.config.orders {
            let order_number = format!("SO{}", 43_697 + order);
            let order_date = range.start + Duration::days(rng.gen_range(0..range.num_days()));
            let Some(customer) = customers.choose(&mut rng) else {
                continue;
            };

            let line_count = rng.gen_range(1..=self.config.max_lines_per_order);
            for product in products.choose_multiple(&mut rng, line_count) {
                let quantity: i64 = if rng.gen_bool(0.9) { 1 } else { rng.gen_range(2..=4) };
                let price = (product.cost.unwrap_or(1.0) * 1.6).round();
                let undated = rng.gen_bool(self.config.undated_share);

                sales.push(SaleLine {
                    order_number: order_number.clone(),
                    order_date: (!undated).then_some(order_date),
                    product_key: product.product_key,
                    customer_key: customer.customer_key,
                    sales_amount: price * quantity as f64,
                    quantity,
                    price,
                });
            }
        }

        sales
    }
}
