//! SQL output for generated relations.

use crate::config::SchemaConfig;
use chrono::NaiveDate;
use gold_backend::{qualified_name, qualified_schema};
use gold_reports::{Customer, Product, SaleLine};

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn text_or_null(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

fn date_or_null(value: Option<NaiveDate>) -> String {
    value
        .map(|d| format!("DATE '{}'", d.format("%Y-%m-%d")))
        .unwrap_or_else(|| "NULL".to_string())
}

fn number_or_null(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "NULL".to_string())
}

/// Generates `CREATE TABLE` and batched `INSERT` statements.
pub struct SqlOutput {
    schema: SchemaConfig,
    catalog: Option<String>,
    batch_size: usize,
}

impl SqlOutput {
    pub fn new(schema: SchemaConfig) -> Self {
        Self {
            schema,
            catalog: None,
            batch_size: 1000,
        }
    }

    /// Set the number of rows per INSERT statement.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Prefix every relation with a catalog, as `Backend::catalog` reports it.
    pub fn with_catalog(mut self, catalog: Option<&str>) -> Self {
        self.catalog = catalog.map(str::to_string);
        self
    }

    fn qualified(&self, table: &str) -> String {
        qualified_name(self.catalog.as_deref(), &self.schema.db_schema, table)
    }

    fn inserts(&self, table: &str, columns: &str, values: Vec<String>) -> String {
        let mut sql = String::new();

        for chunk in values.chunks(self.batch_size) {
            sql.push_str(&format!(
                "INSERT INTO {} ({}) VALUES\n",
                self.qualified(table),
                columns
            ));
            sql.push_str(&chunk.join(",\n"));
            sql.push_str(";\n\n");
        }

        sql
    }

    /// `dim_products` DDL and rows.
    pub fn format_products(&self, products: &[Product]) -> String {
        let table = &self.schema.dim_products;
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\
             \tproduct_key BIGINT PRIMARY KEY,\n\
             \tproduct_name VARCHAR NOT NULL,\n\
             \tcategory VARCHAR,\n\
             \tsub_category VARCHAR,\n\
             \tcost DOUBLE\n\
             );\n\n",
            self.qualified(table)
        );

        let values = products
            .iter()
            .map(|p| {
                format!(
                    "({}, {}, {}, {}, {})",
                    p.product_key,
                    quote(&p.product_name),
                    text_or_null(p.category.as_deref()),
                    text_or_null(p.sub_category.as_deref()),
                    number_or_null(p.cost)
                )
            })
            .collect();

        sql.push_str(&self.inserts(
            table,
            "product_key, product_name, category, sub_category, cost",
            values,
        ));
        sql
    }

    /// `dim_customers` DDL and rows.
    pub fn format_customers(&self, customers: &[Customer]) -> String {
        let table = &self.schema.dim_customers;
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\
             \tcustomer_key BIGINT PRIMARY KEY,\n\
             \tcustomer_number VARCHAR NOT NULL,\n\
             \tfirst_name VARCHAR,\n\
             \tlast_name VARCHAR,\n\
             \tbirthdate DATE,\n\
             \tgender VARCHAR,\n\
             \tcountry VARCHAR\n\
             );\n\n",
            self.qualified(table)
        );

        let values = customers
            .iter()
            .map(|c| {
                format!(
                    "({}, {}, {}, {}, {}, {}, {})",
                    c.customer_key,
                    quote(&c.customer_number),
                    text_or_null(c.first_name.as_deref()),
                    text_or_null(c.last_name.as_deref()),
                    date_or_null(c.birthdate),
                    text_or_null(c.gender.as_deref()),
                    text_or_null(c.country.as_deref())
                )
            })
            .collect();

        sql.push_str(&self.inserts(
            table,
            "customer_key, customer_number, first_name, last_name, birthdate, gender, country",
            values,
        ));
        sql
    }

    /// `fact_sales` DDL and rows.
    pub fn format_sales(&self, sales: &[SaleLine]) -> String {
        let table = &self.schema.fact_sales;
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\
             \torder_number VARCHAR NOT NULL,\n\
             \tproduct_key BIGINT NOT NULL,\n\
             \tcustomer_key BIGINT NOT NULL,\n\
             \torder_date DATE,\n\
             \tsales_amount DOUBLE,\n\
             \tquantity BIGINT,\n\
             \tprice DOUBLE\n\
             );\n\n",
            self.qualified(table)
        );

        let values = sales
            .iter()
            .map(|s| {
                format!(
                    "({}, {}, {}, {}, {}, {}, {})",
                    quote(&s.order_number),
                    s.product_key,
                    s.customer_key,
                    date_or_null(s.order_date),
                    s.sales_amount,
                    s.quantity,
                    s.price
                )
            })
            .collect();

        sql.push_str(&self.inserts(
            table,
            "order_number, product_key, customer_key, order_date, sales_amount, quantity, price",
            values,
        ));
        sql
    }

    /// Schema creation plus all three relations, dimensions first.
    pub fn format_all(
        &self,
        products: &[Product],
        customers: &[Customer],
        sales: &[SaleLine],
    ) -> String {
        format!(
            "CREATE SCHEMA IF NOT EXISTS {};\n\n{}{}{}",
            qualified_schema(self.catalog.as_deref(), &self.schema.db_schema),
            self.format_products(products),
            self.format_customers(customers),
            self.format_sales(sales)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_are_escaped() {
        let products = vec![Product {
            product_key: 1,
            product_name: "Rider's Cap".to_string(),
            category: None,
            sub_category: Some("Caps".to_string()),
            cost: None,
        }];

        let sql = SqlOutput::new(SchemaConfig::default()).format_products(&products);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS gold.dim_products"));
        assert!(sql.contains("(1, 'Rider''s Cap', NULL, 'Caps', NULL)"));
    }

    #[test]
    fn test_undated_line_writes_null() {
        let sales = vec![SaleLine::new("SO1", None, 3, 4, 50.0, 2)];
        let sql = SqlOutput::new(SchemaConfig::default()).format_sales(&sales);
        assert!(sql.contains("('SO1', 3, 4, NULL, 50, 2, 25)"));
    }

    #[test]
    fn test_batches_split_inserts() {
        let sales: Vec<SaleLine> = (0..5)
            .map(|i| SaleLine::new(format!("SO{}", i), NaiveDate::from_ymd_opt(2013, 1, 1), 1, 1, 10.0, 1))
            .collect();

        let sql = SqlOutput::new(SchemaConfig::default())
            .with_batch_size(2)
            .format_sales(&sales);
        assert_eq!(sql.matches("INSERT INTO gold.fact_sales").count(), 3);
        assert!(sql.contains("DATE '2013-01-01'"));
    }

    #[test]
    fn test_catalog_prefix() {
        let sql = SqlOutput::new(SchemaConfig::default())
            .with_catalog(Some("gold"))
            .format_all(&[], &[], &[]);
        assert!(sql.starts_with("CREATE SCHEMA IF NOT EXISTS \"gold\".gold;"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"gold\".gold.fact_sales"));
    }

    #[test]
    fn test_empty_relation_has_only_ddl() {
        let sql = SqlOutput::new(SchemaConfig::default()).format_customers(&[]);
        assert!(sql.contains("CREATE TABLE"));
        assert!(!sql.contains("INSERT"));
    }
}
