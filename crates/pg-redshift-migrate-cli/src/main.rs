//! pg-redshift-migrate CLI - PostgreSQL to Redshift replication.

use clap::Parser;
use pg_redshift_migrate::{Config, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "pg-redshift-migrate")]
#[command(about = "PostgreSQL to Redshift full-table replication via S3")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Export and load table data (default: DDL only)
    #[arg(long)]
    migrate: bool,

    /// Print every statement instead of executing; skips export and load
    #[arg(long)]
    dry_run: bool,

    /// Emit DDL only; implies --dry-run and needs no target connection
    #[arg(long)]
    schema_only: bool,

    /// Drop each selected target schema CASCADE and recreate it (destructive)
    #[arg(long)]
    drop_and_recreate: bool,

    /// Restrict to these schemas (comma-separated, intersected with discovery)
    #[arg(long, value_delimiter = ',')]
    schemas: Option<Vec<String>>,

    /// Restrict to these tables (comma-separated, intersected with discovery)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Output JSON run summary to stdout
    #[arg(long)]
    output_json: bool,
}

fn init_tracing(format: &str, verbosity: &str) {
    let level = match verbosity {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_format, &cli.verbosity);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.format_detailed());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> pg_redshift_migrate::Result<()> {
    let mut config = Config::load(&cli.config)?;

    // Flag overrides on top of the config file.
    config.migration.migrate |= cli.migrate;
    config.migration.dry_run |= cli.dry_run;
    config.migration.schema_only |= cli.schema_only;
    config.migration.drop_and_recreate |= cli.drop_and_recreate;
    if cli.schemas.is_some() {
        config.filters.schemas = cli.schemas;
    }
    if cli.tables.is_some() {
        config.filters.tables = cli.tables;
    }
    config.validate()?;

    if config.migration.is_dry_run() {
        info!("Dry run: statements will be printed, not executed");
    }

    let orchestrator = Orchestrator::new(config).await?;
    let summary = orchestrator.run().await?;

    if cli.output_json {
        println!("{}", summary.to_json()?);
    } else {
        println!(
            "Replicated {} schema(s), {} table(s) ({} loaded, {} chunks) in {:.1}s",
            summary.schemas_total,
            summary.tables_total,
            summary.tables_loaded,
            summary.chunks_uploaded,
            summary.duration_seconds
        );
    }

    Ok(())
}
