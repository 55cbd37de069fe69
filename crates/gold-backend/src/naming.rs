//! Rendering of relation names.

/// Double-quote an identifier, escaping embedded quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `schema`, prefixed with the quoted catalog when one is given.
pub fn qualified_schema(catalog: Option<&str>, schema: &str) -> String {
    match catalog {
        Some(catalog) => format!("{}.{}", quote_identifier(catalog), schema),
        None => schema.to_string(),
    }
}

/// `schema.name`, prefixed with the quoted catalog when one is given.
///
/// DuckDB names a database's catalog after its file stem, so a file
/// `gold.duckdb` holding schema `gold` needs the three-part form.
pub fn qualified_name(catalog: Option<&str>, schema: &str, name: &str) -> String {
    format!("{}.{}", qualified_schema(catalog, schema), name)
}
