use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not find gold project root.\nExpected to find 'gold.yml' in this directory or one of its parents.\nHint: Pass --database to run without a project file.")]
    ProjectRootNotFound,

    #[error("Failed to load configuration file: {path}\n{source}")]
    ConfigLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Target '{target}' not found in gold.yml. Available targets: {}", available.join(", "))]
    TargetNotFound {
        target: String,
        available: Vec<String>,
    },

    #[error("Unsupported target type '{target_type}'. Only 'duckdb' is available")]
    UnsupportedTarget { target_type: String },

    #[error("Unknown query '{name}'.\n\nAvailable queries:\n  {}", available.join("\n  "))]
    UnknownQuery {
        name: String,
        available: Vec<String>,
    },

    #[error("Query '{name}' failed to execute:\n  {source}\n\nSQL:\n{sql}")]
    QueryError {
        name: String,
        sql: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Report '{report}' failed:\n  {source}")]
    ReportError {
        report: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Source tables not found in database:\n  {}\n\nHint: Load the Gold layer first or use 'gold seed' for demo data", missing.join("\n  "))]
    SourceTablesNotFound { missing: Vec<String> },

    #[error("Unknown preset '{name}'. Available presets: small, medium")]
    UnknownPreset { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_query_lists_catalog() {
        let err = CliError::UnknownQuery {
            name: "nope".to_string(),
            available: vec!["tables".to_string(), "columns".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("Unknown query 'nope'"));
        assert!(message.contains("  tables\n  columns"));
    }

    #[test]
    fn test_missing_sources_are_listed() {
        let err = CliError::SourceTablesNotFound {
            missing: vec!["gold.fact_sales".to_string(), "gold.dim_products".to_string()],
        };
        assert!(err.to_string().contains("gold.fact_sales\n  gold.dim_products"));
    }
}
