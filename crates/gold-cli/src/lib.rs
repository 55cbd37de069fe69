pub mod config;
pub mod errors;
pub mod executor;
pub mod queries;
pub mod views;

pub use config::{find_project_root, BackendType, Config, Relations, Target, WarehouseLayout};
pub use errors::CliError;
pub use executor::{RelationSummary, WarehouseSnapshot};
pub use queries::{NamedQuery, QueryKind, CATALOG};
pub use views::ReportView;
