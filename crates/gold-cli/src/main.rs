use anyhow::{Context, Result};
use arrow::util::pretty;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use gold_backend::Backend;
use gold_backend_duckdb::DuckDbBackend;
use gold_cli::{executor, find_project_root, queries, BackendType, CliError, Config, WarehouseLayout};
use gold_reports::{customer_report_batch, product_report_batch};
use gold_testdata::{presets, WarehouseGenerator, WarehouseLoader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gold")]
#[command(about = "Descriptive analytics over a Gold-layer sales warehouse", long_about = None)]
struct Cli {
    /// Path to gold project root
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// DuckDB database file path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Target environment from gold.yml
    #[arg(long, global = true, default_value = "dev")]
    target: String,

    /// Evaluation date for recency and age (reports default to today, views
    /// and queries to the database's current_date)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List relations in the target schema with their row counts
    Inspect,
    /// Run a named analytical query
    Query(QueryArgs),
    /// Compute a product or customer report
    Report(ReportArgs),
    /// Create or replace the report views in the target schema
    Views(ViewsArgs),
    /// Load deterministic demo data into the target
    Seed(SeedArgs),
}

#[derive(Parser)]
struct QueryArgs {
    /// Query name (see --list)
    #[arg(required_unless_present = "list")]
    name: Option<String>,

    /// Number of rows for ranking queries
    #[arg(long)]
    limit: Option<usize>,

    /// List the available queries
    #[arg(long)]
    list: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Products,
    Customers,
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(value_enum)]
    kind: ReportKind,

    /// Print at most this many rows
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Parser)]
struct ViewsArgs {
    /// Display a preview of each view after installing it
    #[arg(long)]
    show_results: bool,
}

#[derive(Parser)]
struct SeedArgs {
    /// Size preset: small or medium
    #[arg(long, default_value = "small")]
    preset: String,

    /// Override the preset's seed
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (backend, layout) = connect(&cli).await?;
    let as_of = cli.as_of;

    match cli.command {
        Commands::Inspect => inspect(backend.as_ref(), &layout).await,
        Commands::Query(args) => query(backend.as_ref(), &layout, args, as_of).await,
        Commands::Report(args) => report(backend.as_ref(), &layout, args, as_of).await,
        Commands::Views(args) => views(backend.as_ref(), &layout, args, as_of).await,
        Commands::Seed(args) => seed(backend.as_ref(), &layout, args).await,
    }
}

async fn connect(cli: &Cli) -> Result<(Box<dyn Backend>, WarehouseLayout)> {
    let (config, project_dir) = match find_project_root(&cli.project_dir) {
        Ok(dir) => {
            let config = Config::load(&dir)
                .with_context(|| "Failed to load gold.yml configuration")?;
            (config, dir)
        }
        Err(_) if cli.database.is_some() => (Config::standalone(), cli.project_dir.clone()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to find project root from {:?}", cli.project_dir)
            })
        }
    };

    let target = config.target(&cli.target)?;
    let layout = config.layout(target);

    let backend: Box<dyn Backend> = match target.backend_type()? {
        BackendType::DuckDB => {
            let db_path = cli
                .database
                .clone()
                .or_else(|| target.database.as_ref().map(|db| project_dir.join(db)));

            match db_path {
                Some(path) => {
                    tracing::info!(database = %path.display(), schema = %layout.schema, "Opening DuckDB");
                    Box::new(
                        DuckDbBackend::new(&path, &layout.schema)
                            .await
                            .with_context(|| format!("Failed to initialize DuckDB at {:?}", path))?,
                    )
                }
                None => {
                    tracing::warn!("No database configured for target '{}'; using an in-memory warehouse", cli.target);
                    Box::new(DuckDbBackend::in_memory(&layout.schema)?)
                }
            }
        }
    };

    Ok((backend, layout))
}

async fn inspect(backend: &dyn Backend, layout: &WarehouseLayout) -> Result<()> {
    let (relations, missing) = executor::inspect(backend, layout).await?;

    println!("Schema: {}", layout.schema);
    println!("{:<32} {:<12} {:>8} {:>12}", "relation", "type", "columns", "rows");
    for relation in &relations {
        println!(
            "{:<32} {:<12} {:>8} {:>12}",
            relation.name, relation.table_type, relation.column_count, relation.row_count
        );
    }

    if !missing.is_empty() {
        println!("\nMissing source relations:");
        for name in &missing {
            println!("  {}", name);
        }
    }

    Ok(())
}

async fn query(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    args: QueryArgs,
    as_of: Option<NaiveDate>,
) -> Result<()> {
    if args.list {
        for query in queries::CATALOG {
            println!("{:<28} {:<18} {}", query.name, query.kind, query.description);
        }
        return Ok(());
    }

    let Some(name) = args.name else {
        return Ok(());
    };
    let query = queries::find(&name)?;
    if args.limit.is_some() && !query.takes_limit() {
        tracing::warn!(query = query.name, "--limit only applies to ranking queries; ignoring it");
    }

    let batches = executor::run_query(backend, layout, query, args.limit, as_of).await?;
    pretty::print_batches(&batches).with_context(|| "Failed to print query results")?;
    Ok(())
}

async fn report(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    args: ReportArgs,
    as_of: Option<NaiveDate>,
) -> Result<()> {
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    println!("Report date: {}", as_of);

    let batch = match args.kind {
        ReportKind::Products => {
            let mut rows = executor::product_report(backend, layout, as_of).await?;
            if let Some(limit) = args.limit {
                rows.truncate(limit);
            }
            product_report_batch(&rows)?
        }
        ReportKind::Customers => {
            let mut rows = executor::customer_report(backend, layout, as_of).await?;
            if let Some(limit) = args.limit {
                rows.truncate(limit);
            }
            customer_report_batch(&rows)?
        }
    };

    pretty::print_batches(&[batch]).with_context(|| "Failed to print report")?;
    Ok(())
}

async fn views(
    backend: &dyn Backend,
    layout: &WarehouseLayout,
    args: ViewsArgs,
    as_of: Option<NaiveDate>,
) -> Result<()> {
    let results = executor::install_views(backend, layout, as_of, args.show_results).await?;

    for result in &results {
        println!(
            "✓ {}.{} ({} rows, {:?})",
            layout.schema, result.relation, result.row_count, result.duration
        );

        if let Some(ref batches) = result.preview {
            pretty::print_batches(batches).with_context(|| "Failed to print view preview")?;
            println!();
        }
    }

    Ok(())
}

async fn seed(backend: &dyn Backend, layout: &WarehouseLayout, args: SeedArgs) -> Result<()> {
    let mut config = presets::by_name(&args.preset).ok_or_else(|| CliError::UnknownPreset {
        name: args.preset.clone(),
    })?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.schema = layout.schema_config();

    let data = WarehouseGenerator::new(config.clone()).generate();
    let result = backend
        .load_warehouse(&config.schema, &data)
        .await
        .with_context(|| format!("Failed to load demo data into schema '{}'", layout.schema))?;

    println!("✓ {} (seed {})", result, config.seed);
    Ok(())
}
