//! Named analytical queries over the Gold layer.
//!
//! Every query is read-only DuckDB SQL rendered against a
//! [`WarehouseLayout`], so renamed schemas and relations work unchanged.

use crate::config::WarehouseLayout;
use crate::errors::CliError;
use chrono::NaiveDate;

/// What a query explores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Schema,
    Dimension,
    Date,
    Measure,
    Magnitude,
    Ranking,
    ChangeOverTime,
    Cumulative,
    Performance,
    Segmentation,
    PartToWhole,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QueryKind::Schema => "schema",
            QueryKind::Dimension => "dimension",
            QueryKind::Date => "date",
            QueryKind::Measure => "measure",
            QueryKind::Magnitude => "magnitude",
            QueryKind::Ranking => "ranking",
            QueryKind::ChangeOverTime => "change over time",
            QueryKind::Cumulative => "cumulative",
            QueryKind::Performance => "performance",
            QueryKind::Segmentation => "segmentation",
            QueryKind::PartToWhole => "part-to-whole",
        };
        write!(f, "{}", label)
    }
}

/// A catalog entry.
pub struct NamedQuery {
    pub name: &'static str,
    pub kind: QueryKind,
    pub description: &'static str,
    /// Row limit for ranking queries; `None` for queries that return everything.
    pub default_limit: Option<usize>,
    render: fn(&WarehouseLayout, usize, &str) -> String,
}

/// SQL expression for the evaluation date: a literal, or `current_date`.
pub fn evaluation_date(as_of: Option<NaiveDate>) -> String {
    match as_of {
        Some(date) => format!("DATE '{}'", date.format("%Y-%m-%d")),
        None => "current_date".to_string(),
    }
}

impl NamedQuery {
    /// Render the SQL. `limit` only affects queries with a default limit;
    /// `as_of` only affects queries that measure age.
    pub fn render(
        &self,
        layout: &WarehouseLayout,
        limit: Option<usize>,
        as_of: Option<NaiveDate>,
    ) -> String {
        let limit = self
            .default_limit
            .map(|default| limit.unwrap_or(default))
            .unwrap_or(0);
        (self.render)(layout, limit, &evaluation_date(as_of))
    }

    pub fn takes_limit(&self) -> bool {
        self.default_limit.is_some()
    }
}

impl std::fmt::Debug for NamedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedQuery")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

pub static CATALOG: &[NamedQuery] = &[
    NamedQuery {
        name: "tables",
        kind: QueryKind::Schema,
        description: "Tables and views in the target schema",
        default_limit: None,
        render: tables,
    },
    NamedQuery {
        name: "columns",
        kind: QueryKind::Schema,
        description: "Columns of every relation in the target schema",
        default_limit: None,
        render: columns,
    },
    NamedQuery {
        name: "countries",
        kind: QueryKind::Dimension,
        description: "Distinct customer countries",
        default_limit: None,
        render: countries,
    },
    NamedQuery {
        name: "categories",
        kind: QueryKind::Dimension,
        description: "Category, sub-category and product hierarchy",
        default_limit: None,
        render: categories,
    },
    NamedQuery {
        name: "order_date_range",
        kind: QueryKind::Date,
        description: "First and last order date and the span between them",
        default_limit: None,
        render: order_date_range,
    },
    NamedQuery {
        name: "customer_age_range",
        kind: QueryKind::Date,
        description: "Oldest and youngest customer",
        default_limit: None,
        render: customer_age_range,
    },
    NamedQuery {
        name: "key_metrics",
        kind: QueryKind::Measure,
        description: "Headline measures of the business",
        default_limit: None,
        render: key_metrics,
    },
    NamedQuery {
        name: "customers_by_country",
        kind: QueryKind::Magnitude,
        description: "Customer count per country",
        default_limit: None,
        render: customers_by_country,
    },
    NamedQuery {
        name: "customers_by_gender",
        kind: QueryKind::Magnitude,
        description: "Customer count per gender",
        default_limit: None,
        render: customers_by_gender,
    },
    NamedQuery {
        name: "products_by_category",
        kind: QueryKind::Magnitude,
        description: "Product count per category",
        default_limit: None,
        render: products_by_category,
    },
    NamedQuery {
        name: "avg_cost_by_category",
        kind: QueryKind::Magnitude,
        description: "Average product cost per category",
        default_limit: None,
        render: avg_cost_by_category,
    },
    NamedQuery {
        name: "revenue_by_category",
        kind: QueryKind::Magnitude,
        description: "Revenue per category",
        default_limit: None,
        render: revenue_by_category,
    },
    NamedQuery {
        name: "revenue_by_customer",
        kind: QueryKind::Magnitude,
        description: "Revenue per customer",
        default_limit: None,
        render: revenue_by_customer,
    },
    NamedQuery {
        name: "quantity_by_country",
        kind: QueryKind::Magnitude,
        description: "Items sold per customer country",
        default_limit: None,
        render: quantity_by_country,
    },
    NamedQuery {
        name: "top_products",
        kind: QueryKind::Ranking,
        description: "Highest-revenue products",
        default_limit: Some(5),
        render: top_products,
    },
    NamedQuery {
        name: "bottom_products",
        kind: QueryKind::Ranking,
        description: "Lowest-revenue products",
        default_limit: Some(5),
        render: bottom_products,
    },
    NamedQuery {
        name: "top_customers",
        kind: QueryKind::Ranking,
        description: "Highest-revenue customers",
        default_limit: Some(10),
        render: top_customers,
    },
    NamedQuery {
        name: "fewest_order_customers",
        kind: QueryKind::Ranking,
        description: "Customers with the fewest orders",
        default_limit: Some(3),
        render: fewest_order_customers,
    },
    NamedQuery {
        name: "sales_by_month",
        kind: QueryKind::ChangeOverTime,
        description: "Sales, customers and quantity per month",
        default_limit: None,
        render: sales_by_month,
    },
    NamedQuery {
        name: "running_sales_by_month",
        kind: QueryKind::Cumulative,
        description: "Running total of sales and moving average price per month",
        default_limit: None,
        render: running_sales_by_month,
    },
    NamedQuery {
        name: "yearly_product_performance",
        kind: QueryKind::Performance,
        description: "Yearly product sales against the product average and the previous year",
        default_limit: None,
        render: yearly_product_performance,
    },
    NamedQuery {
        name: "product_cost_ranges",
        kind: QueryKind::Segmentation,
        description: "Product count per cost range",
        default_limit: None,
        render: product_cost_ranges,
    },
    NamedQuery {
        name: "category_share",
        kind: QueryKind::PartToWhole,
        description: "Each category's share of overall sales",
        default_limit: None,
        render: category_share,
    },
];

/// Look up a query by name.
pub fn find(name: &str) -> Result<&'static NamedQuery, CliError> {
    CATALOG
        .iter()
        .find(|q| q.name == name)
        .ok_or_else(|| CliError::UnknownQuery {
            name: name.to_string(),
            available: CATALOG.iter().map(|q| q.name.to_string()).collect(),
        })
}

fn tables(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT table_catalog, table_schema, table_name, table_type
FROM information_schema.tables
WHERE table_catalog = current_database() AND table_schema = '{schema}'
ORDER BY table_name",
        schema = w.schema
    )
}

fn columns(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT table_name, column_name, data_type, is_nullable
FROM information_schema.columns
WHERE table_catalog = current_database() AND table_schema = '{schema}'
ORDER BY table_name, ordinal_position",
        schema = w.schema
    )
}

fn countries(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT DISTINCT country FROM {customers} ORDER BY country",
        customers = w.dim_customers()
    )
}

fn categories(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT DISTINCT category, sub_category, product_name
FROM {products}
ORDER BY category, sub_category, product_name",
        products = w.dim_products()
    )
}

fn order_date_range(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT
    MIN(order_date) AS first_order_date,
    MAX(order_date) AS last_order_date,
    date_diff('year', MIN(order_date), MAX(order_date)) AS order_range_years,
    date_diff('month', MIN(order_date), MAX(order_date)) AS order_range_months
FROM {sales}",
        sales = w.fact_sales()
    )
}

fn customer_age_range(w: &WarehouseLayout, _: usize, today: &str) -> String {
    format!(
        "SELECT
    MIN(birthdate) AS oldest_birthdate,
    date_diff('year', MIN(birthdate), {today}) AS oldest_age,
    MAX(birthdate) AS youngest_birthdate,
    date_diff('year', MAX(birthdate), {today}) AS youngest_age
FROM {customers}",
        customers = w.dim_customers()
    )
}

fn key_metrics(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT measure_name, measure_value FROM (
    SELECT 1 AS ordinal, 'Total Sales' AS measure_name, CAST(SUM(sales_amount) AS DOUBLE) AS measure_value FROM {sales}
    UNION ALL
    SELECT 2, 'Total Quantity', CAST(SUM(quantity) AS DOUBLE) FROM {sales}
    UNION ALL
    SELECT 3, 'Average Price', CAST(AVG(price) AS DOUBLE) FROM {sales}
    UNION ALL
    SELECT 4, 'Total Orders', CAST(COUNT(DISTINCT order_number) AS DOUBLE) FROM {sales}
    UNION ALL
    SELECT 5, 'Total Products', CAST(COUNT(DISTINCT product_key) AS DOUBLE) FROM {products}
    UNION ALL
    SELECT 6, 'Total Customers', CAST(COUNT(customer_key) AS DOUBLE) FROM {customers}
    UNION ALL
    SELECT 7, 'Customers With Orders', CAST(COUNT(DISTINCT customer_key) AS DOUBLE) FROM {sales}
) AS metrics
ORDER BY ordinal",
        sales = w.fact_sales(),
        products = w.dim_products(),
        customers = w.dim_customers()
    )
}

fn customers_by_country(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT country, COUNT(customer_key) AS total_customers
FROM {customers}
GROUP BY country
ORDER BY total_customers DESC, country",
        customers = w.dim_customers()
    )
}

fn customers_by_gender(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT gender, COUNT(customer_key) AS total_customers
FROM {customers}
GROUP BY gender
ORDER BY total_customers DESC, gender",
        customers = w.dim_customers()
    )
}

fn products_by_category(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT category, COUNT(product_key) AS total_products
FROM {products}
GROUP BY category
ORDER BY total_products DESC, category",
        products = w.dim_products()
    )
}

fn avg_cost_by_category(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT category, AVG(cost) AS avg_cost
FROM {products}
GROUP BY category
ORDER BY avg_cost DESC, category",
        products = w.dim_products()
    )
}

fn revenue_by_category(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT p.category, SUM(f.sales_amount) AS total_revenue
FROM {sales} f
LEFT JOIN {products} p ON p.product_key = f.product_key
GROUP BY p.category
ORDER BY total_revenue DESC, p.category",
        sales = w.fact_sales(),
        products = w.dim_products()
    )
}

fn revenue_by_customer(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT f.customer_key, c.first_name, c.last_name, SUM(f.sales_amount) AS total_revenue
FROM {sales} f
LEFT JOIN {customers} c ON c.customer_key = f.customer_key
GROUP BY f.customer_key, c.first_name, c.last_name
ORDER BY total_revenue DESC, f.customer_key",
        sales = w.fact_sales(),
        customers = w.dim_customers()
    )
}

fn quantity_by_country(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT c.country, SUM(f.quantity) AS total_sold_items
FROM {sales} f
LEFT JOIN {customers} c ON c.customer_key = f.customer_key
GROUP BY c.country
ORDER BY total_sold_items DESC, c.country",
        sales = w.fact_sales(),
        customers = w.dim_customers()
    )
}

fn ranked_products(w: &WarehouseLayout, limit: usize, direction: &str) -> String {
    format!(
        "SELECT product_key, product_name, total_revenue, revenue_rank
FROM (
    SELECT
        f.product_key,
        p.product_name,
        SUM(f.sales_amount) AS total_revenue,
        RANK() OVER (ORDER BY SUM(f.sales_amount) {direction}) AS revenue_rank
    FROM {sales} f
    LEFT JOIN {products} p ON p.product_key = f.product_key
    GROUP BY f.product_key, p.product_name
) AS ranked
WHERE revenue_rank <= {limit}
ORDER BY revenue_rank, product_key",
        sales = w.fact_sales(),
        products = w.dim_products()
    )
}

fn top_products(w: &WarehouseLayout, limit: usize, _: &str) -> String {
    ranked_products(w, limit, "DESC")
}

fn bottom_products(w: &WarehouseLayout, limit: usize, _: &str) -> String {
    ranked_products(w, limit, "ASC")
}

fn top_customers(w: &WarehouseLayout, limit: usize, _: &str) -> String {
    format!(
        "SELECT f.customer_key, c.first_name, c.last_name, SUM(f.sales_amount) AS total_revenue
FROM {sales} f
LEFT JOIN {customers} c ON c.customer_key = f.customer_key
GROUP BY f.customer_key, c.first_name, c.last_name
ORDER BY total_revenue DESC, f.customer_key
LIMIT {limit}",
        sales = w.fact_sales(),
        customers = w.dim_customers()
    )
}

fn fewest_order_customers(w: &WarehouseLayout, limit: usize, _: &str) -> String {
    format!(
        "SELECT f.customer_key, c.first_name, c.last_name, COUNT(DISTINCT f.order_number) AS total_orders
FROM {sales} f
LEFT JOIN {customers} c ON c.customer_key = f.customer_key
GROUP BY f.customer_key, c.first_name, c.last_name
ORDER BY total_orders ASC, f.customer_key
LIMIT {limit}",
        sales = w.fact_sales(),
        customers = w.dim_customers()
    )
}

fn sales_by_month(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT
    CAST(date_trunc('month', order_date) AS DATE) AS order_month,
    SUM(sales_amount) AS total_sales,
    COUNT(DISTINCT customer_key) AS total_customers,
    SUM(quantity) AS total_quantity
FROM {sales}
WHERE order_date IS NOT NULL
GROUP BY 1
ORDER BY 1",
        sales = w.fact_sales()
    )
}

fn running_sales_by_month(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "SELECT
    order_month,
    total_sales,
    SUM(total_sales) OVER (ORDER BY order_month) AS running_total_sales,
    AVG(avg_price) OVER (ORDER BY order_month) AS moving_average_price
FROM (
    SELECT
        CAST(date_trunc('month', order_date) AS DATE) AS order_month,
        SUM(sales_amount) AS total_sales,
        AVG(price) AS avg_price
    FROM {sales}
    WHERE order_date IS NOT NULL
    GROUP BY 1
) AS monthly
ORDER BY order_month",
        sales = w.fact_sales()
    )
}

fn yearly_product_performance(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "WITH yearly_product_sales AS (
    SELECT
        year(f.order_date) AS order_year,
        p.product_name,
        SUM(f.sales_amount) AS current_sales
    FROM {sales} f
    LEFT JOIN {products} p ON p.product_key = f.product_key
    WHERE f.order_date IS NOT NULL
    GROUP BY 1, 2
),
compared AS (
    SELECT
        order_year,
        product_name,
        current_sales,
        AVG(current_sales) OVER (PARTITION BY product_name) AS avg_sales,
        LAG(current_sales) OVER (PARTITION BY product_name ORDER BY order_year) AS py_sales
    FROM yearly_product_sales
)
SELECT
    order_year,
    product_name,
    current_sales,
    avg_sales,
    current_sales - avg_sales AS diff_avg,
    CASE
        WHEN current_sales - avg_sales > 0 THEN 'Above Avg'
        WHEN current_sales - avg_sales < 0 THEN 'Below Avg'
        ELSE 'Avg'
    END AS avg_change,
    py_sales,
    current_sales - py_sales AS diff_py,
    CASE
        WHEN current_sales - py_sales > 0 THEN 'Increase'
        WHEN current_sales - py_sales < 0 THEN 'Decrease'
        ELSE 'No Change'
    END AS py_change
FROM compared
ORDER BY product_name, order_year",
        sales = w.fact_sales(),
        products = w.dim_products()
    )
}

fn product_cost_ranges(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "WITH product_segments AS (
    SELECT
        product_key,
        CASE
            WHEN cost < 100 THEN 'Below 100'
            WHEN cost BETWEEN 100 AND 500 THEN '100-500'
            WHEN cost BETWEEN 500 AND 1000 THEN '500-1000'
            ELSE 'Above 1000'
        END AS cost_range
    FROM {products}
)
SELECT cost_range, COUNT(product_key) AS total_products
FROM product_segments
GROUP BY cost_range
ORDER BY total_products DESC, cost_range",
        products = w.dim_products()
    )
}

fn category_share(w: &WarehouseLayout, _: usize, _: &str) -> String {
    format!(
        "WITH category_sales AS (
    SELECT p.category, SUM(f.sales_amount) AS total_sales
    FROM {sales} f
    LEFT JOIN {products} p ON p.product_key = f.product_key
    GROUP BY p.category
)
SELECT
    category,
    total_sales,
    SUM(total_sales) OVER () AS overall_sales,
    ROUND(100.0 * total_sales / SUM(total_sales) OVER (), 2) AS percentage_of_total
FROM category_sales
ORDER BY total_sales DESC, category",
        sales = w.fact_sales(),
        products = w.dim_products()
    )
}
