//! SQL definitions of the two report views.
//!
//! The views mirror the native reports in `gold_reports`. Recency and age
//! are measured against a fixed as-of date when one is given, otherwise
//! against `current_date` at query time.

use crate::config::WarehouseLayout;
use crate::queries::evaluation_date;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    Products,
    Customers,
}

impl ReportView {
    pub const ALL: [ReportView; 2] = [ReportView::Products, ReportView::Customers];

    pub fn name(&self) -> &'static str {
        match self {
            ReportView::Products => "report_products",
            ReportView::Customers => "report_customers",
        }
    }

    pub fn sql(&self, layout: &WarehouseLayout, as_of: Option<NaiveDate>) -> String {
        let today = evaluation_date(as_of);
        match self {
            ReportView::Products => product_report_sql(layout, &today),
            ReportView::Customers => customer_report_sql(layout, &today),
        }
    }
}

impl std::fmt::Display for ReportView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn product_report_sql(w: &WarehouseLayout, today: &str) -> String {
    format!(
        r#"WITH base_query AS (
    SELECT
        f.order_number,
        f.order_date,
        f.customer_key,
        f.sales_amount,
        f.quantity,
        f.product_key,
        p.product_name,
        p.category,
        p.sub_category,
        p.cost
    FROM {sales} f
    LEFT JOIN {products} p ON p.product_key = f.product_key
    WHERE f.order_date IS NOT NULL
),
product_aggregations AS (
    SELECT
        product_key,
        product_name,
        category,
        sub_category,
        cost,
        date_diff('month', MIN(order_date), MAX(order_date)) AS lifespan,
        MAX(order_date) AS last_sale_date,
        COUNT(DISTINCT order_number) AS total_orders,
        COUNT(DISTINCT customer_key) AS total_customers,
        CAST(COALESCE(SUM(sales_amount), 0) AS DOUBLE) AS total_sales,
        COALESCE(SUM(quantity), 0) AS total_quantity,
        ROUND(AVG(CAST(sales_amount AS DOUBLE) / NULLIF(quantity, 0)), 1) AS avg_selling_price
    FROM base_query
    GROUP BY product_key, product_name, category, sub_category, cost
)
SELECT
    product_key,
    product_name,
    category,
    sub_category,
    cost,
    last_sale_date,
    date_diff('month', last_sale_date, {today}) AS recency_in_months,
    CASE
        WHEN total_sales > 50000 THEN 'High-Performer'
        WHEN total_sales >= 10000 THEN 'Mid-Range'
        ELSE 'Low-Performer'
    END AS product_segment,
    lifespan,
    total_orders,
    total_sales,
    total_quantity,
    total_customers,
    avg_selling_price,
    CASE
        WHEN total_orders = 0 THEN 0
        ELSE total_sales / total_orders
    END AS avg_order_revenue,
    CASE
        WHEN lifespan = 0 THEN total_sales
        ELSE total_sales / lifespan
    END AS avg_monthly_revenue
FROM product_aggregations"#,
        sales = w.fact_sales(),
        products = w.dim_products()
    )
}

fn customer_report_sql(w: &WarehouseLayout, today: &str) -> String {
    format!(
        r#"WITH base_query AS (
    SELECT
        f.order_number,
        f.product_key,
        f.order_date,
        f.sales_amount,
        f.quantity,
        f.customer_key,
        c.customer_number,
        CASE
            WHEN c.customer_key IS NULL THEN NULL
            ELSE concat(COALESCE(c.first_name, ''), ' ', COALESCE(c.last_name, ''))
        END AS customer_name,
        date_diff('year', c.birthdate, {today}) AS customer_age
    FROM {sales} f
    LEFT JOIN {customers} c ON c.customer_key = f.customer_key
    WHERE f.order_date IS NOT NULL
),
customer_aggregation AS (
    SELECT
        customer_key,
        customer_number,
        customer_name,
        customer_age,
        COUNT(DISTINCT order_number) AS total_order_num,
        CAST(COALESCE(SUM(sales_amount), 0) AS DOUBLE) AS total_sales,
        COALESCE(SUM(quantity), 0) AS total_quantity,
        COUNT(DISTINCT product_key) AS total_product,
        MAX(order_date) AS last_order,
        date_diff('month', MIN(order_date), MAX(order_date)) AS lifespan
    FROM base_query
    GROUP BY customer_key, customer_number, customer_name, customer_age
)
SELECT
    customer_key,
    customer_number,
    customer_name,
    customer_age,
    CASE
        WHEN customer_age < 20 THEN 'Under 20'
        WHEN customer_age BETWEEN 20 AND 29 THEN '20-29'
        WHEN customer_age BETWEEN 30 AND 39 THEN '30-39'
        WHEN customer_age BETWEEN 40 AND 49 THEN '40-49'
        ELSE '50 and above'
    END AS age_segmentation,
    CASE
        WHEN lifespan >= 12 AND total_sales > 5000 THEN 'VIP'
        WHEN lifespan >= 12 THEN 'Regular'
        ELSE 'New'
    END AS customer_segmentation,
    last_order,
    date_diff('month', last_order, {today}) AS recency_in_month,
    total_order_num,
    total_sales,
    total_quantity,
    total_product,
    lifespan,
    CASE
        WHEN total_sales = 0 OR total_order_num = 0 THEN 0
        ELSE total_sales / total_order_num
    END AS avg_order_value,
    CASE
        WHEN lifespan = 0 THEN total_sales
        ELSE total_sales / lifespan
    END AS avg_monthly_spending
FROM customer_aggregation"#,
        sales = w.fact_sales(),
        customers = w.dim_customers()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names() {
        assert_eq!(ReportView::Products.name(), "report_products");
        assert_eq!(ReportView::Customers.to_string(), "report_customers");
    }

    #[test]
    fn test_views_read_configured_relations() {
        let layout = WarehouseLayout::default();

        let sql = ReportView::Products.sql(&layout, None);
        assert!(sql.contains("FROM gold.fact_sales f"));
        assert!(sql.contains("LEFT JOIN gold.dim_products p"));
        assert!(sql.contains("WHERE f.order_date IS NOT NULL"));

        let sql = ReportView::Customers.sql(&layout, None);
        assert!(sql.contains("LEFT JOIN gold.dim_customers c"));
        assert!(sql.contains("ELSE '50 and above'"));
        assert!(sql.contains("date_diff('year', c.birthdate, current_date)"));
    }

    #[test]
    fn test_fixed_evaluation_date() {
        let sql = ReportView::Customers.sql(&WarehouseLayout::default(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(sql.contains("date_diff('month', last_order, DATE '2024-01-01') AS recency_in_month"));
        assert!(!sql.contains("current_date"));
    }
}
