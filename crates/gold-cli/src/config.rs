use crate::errors::CliError;
use anyhow::Result;
use gold_backend::qualified_name;
use gold_testdata::SchemaConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "gold.yml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub name: String,
    pub version: u32,
    pub targets: HashMap<String, Target>,
    #[serde(default)]
    pub relations: Relations,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub target_type: String,
    /// DuckDB file, relative to the project root. In-memory when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "gold".to_string()
}

impl Target {
    pub fn backend_type(&self) -> Result<BackendType, CliError> {
        match self.target_type.to_lowercase().as_str() {
            "duckdb" => Ok(BackendType::DuckDB),
            _ => Err(CliError::UnsupportedTarget {
                target_type: self.target_type.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    DuckDB,
}

/// Names of the three Gold relations inside the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Relations {
    pub fact_sales: String,
    pub dim_products: String,
    pub dim_customers: String,
}

impl Default for Relations {
    fn default() -> Self {
        Self {
            fact_sales: "fact_sales".to_string(),
            dim_products: "dim_products".to_string(),
            dim_customers: "dim_customers".to_string(),
        }
    }
}

/// Schema plus relation names, resolved for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseLayout {
    /// Catalog prefix for rendered SQL; set from the connected backend.
    pub catalog: Option<String>,
    pub schema: String,
    pub relations: Relations,
}

impl WarehouseLayout {
    pub fn new(schema: impl Into<String>, relations: Relations) -> Self {
        Self {
            catalog: None,
            schema: schema.into(),
            relations,
        }
    }

    pub fn with_catalog(mut self, catalog: Option<&str>) -> Self {
        self.catalog = catalog.map(str::to_string);
        self
    }

    pub fn qualified(&self, name: &str) -> String {
        qualified_name(self.catalog.as_deref(), &self.schema, name)
    }

    pub fn fact_sales(&self) -> String {
        self.qualified(&self.relations.fact_sales)
    }

    pub fn dim_products(&self) -> String {
        self.qualified(&self.relations.dim_products)
    }

    pub fn dim_customers(&self) -> String {
        self.qualified(&self.relations.dim_customers)
    }

    /// The three source relations as `(schema, name)` pairs, fact first.
    pub fn sources(&self) -> [(&str, &str); 3] {
        [
            (self.schema.as_str(), self.relations.fact_sales.as_str()),
            (self.schema.as_str(), self.relations.dim_products.as_str()),
            (self.schema.as_str(), self.relations.dim_customers.as_str()),
        ]
    }

    /// Where `gold seed` writes its generated relations.
    pub fn schema_config(&self) -> SchemaConfig {
        SchemaConfig {
            db_schema: self.schema.clone(),
            fact_sales: self.relations.fact_sales.clone(),
            dim_products: self.relations.dim_products.clone(),
            dim_customers: self.relations.dim_customers.clone(),
        }
    }
}

impl Default for WarehouseLayout {
    fn default() -> Self {
        Self::new(default_schema(), Relations::default())
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content =
            std::fs::read_to_string(&config_path).map_err(|e| CliError::ConfigLoadError {
                path: config_path.clone(),
                source: e.into(),
            })?;

        serde_yaml::from_str(&content).map_err(|e| {
            CliError::ConfigLoadError {
                path: config_path,
                source: e.into(),
            }
            .into()
        })
    }

    /// Configuration used when no `gold.yml` exists and a database is given
    /// on the command line.
    pub fn standalone() -> Self {
        let mut targets = HashMap::new();
        targets.insert(
            "dev".to_string(),
            Target {
                target_type: "duckdb".to_string(),
                database: None,
                schema: default_schema(),
            },
        );

        Self {
            name: "gold".to_string(),
            version: 1,
            targets,
            relations: Relations::default(),
        }
    }

    pub fn target(&self, name: &str) -> Result<&Target, CliError> {
        self.targets.get(name).ok_or_else(|| {
            let mut available: Vec<String> = self.targets.keys().cloned().collect();
            available.sort();
            CliError::TargetNotFound {
                target: name.to_string(),
                available,
            }
        })
    }

    pub fn layout(&self, target: &Target) -> WarehouseLayout {
        WarehouseLayout::new(target.schema.clone(), self.relations.clone())
    }
}

/// Find the gold project root by looking for gold.yml
pub fn find_project_root(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();

    // Walk up max 5 levels
    for _ in 0..5 {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    Err(CliError::ProjectRootNotFound.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
name: sales_analytics
version: 1
targets:
  dev:
    type: duckdb
    database: warehouse.duckdb
    schema: gold
relations:
  fact_sales: sales
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "sales_analytics");
        let target = config.target("dev").unwrap();
        assert_eq!(target.database.as_deref(), Some("warehouse.duckdb"));
        assert_eq!(target.backend_type().unwrap(), BackendType::DuckDB);

        // Unlisted relations keep their defaults
        assert_eq!(config.relations.fact_sales, "sales");
        assert_eq!(config.relations.dim_products, "dim_products");
    }

    #[test]
    fn test_defaults_without_relations_or_schema() {
        let yaml = r#"
name: demo
version: 1
targets:
  mem:
    type: DuckDB
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let target = config.target("mem").unwrap();
        assert!(target.database.is_none());
        assert_eq!(target.schema, "gold");
        assert_eq!(config.relations, Relations::default());

        let layout = config.layout(target);
        assert_eq!(layout.fact_sales(), "gold.fact_sales");
        assert_eq!(layout.dim_customers(), "gold.dim_customers");
    }

    #[test]
    fn test_unknown_target_lists_available() {
        let config = Config::standalone();
        let err = config.target("prod").unwrap_err();
        assert!(matches!(err, CliError::TargetNotFound { ref available, .. } if available == &vec!["dev".to_string()]));
    }

    #[test]
    fn test_unsupported_target_type() {
        let target = Target {
            target_type: "spark".to_string(),
            database: None,
            schema: "gold".to_string(),
        };
        assert!(matches!(
            target.backend_type(),
            Err(CliError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_find_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: x\nversion: 1\ntargets: {}\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, dir.path());

        let config = Config::load(&root).unwrap();
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: [unclosed").unwrap();

        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("gold.yml"));
    }

    #[test]
    fn test_catalog_qualifies_relations() {
        let layout = WarehouseLayout::default().with_catalog(Some("gold"));
        assert_eq!(layout.fact_sales(), "\"gold\".gold.fact_sales");
        assert_eq!(layout.dim_products(), "\"gold\".gold.dim_products");
    }

    #[test]
    fn test_schema_config_follows_layout() {
        let layout = WarehouseLayout::new(
            "analytics",
            Relations {
                fact_sales: "sales".to_string(),
                ..Relations::default()
            },
        );
        let schema = layout.schema_config();
        assert_eq!(schema.db_schema, "analytics");
        assert_eq!(schema.fact_sales, "sales");
        assert_eq!(schema.dim_products, "dim_products");
    }
}
