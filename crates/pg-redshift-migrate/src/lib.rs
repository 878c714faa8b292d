//! # pg-redshift-migrate
//!
//! PostgreSQL to Amazon Redshift full-table replication library.
//!
//! Redshift only accepts bulk, file-based loads, so each run streams every
//! selected table through a gzip chunker into S3 and swaps it into the
//! warehouse with a transactional backup-rename load:
//!
//! - **Catalog discovery** of eligible schemas, tables, and columns
//! - **Type translation** from PostgreSQL types to Redshift-compatible ones
//! - **Chunked export** over the COPY protocol with bounded memory
//! - **Backup-swap load** that never exposes a half-loaded table
//! - **Dry-run mode** that prints every statement instead of executing
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg_redshift_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> pg_redshift_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let summary = orchestrator.run().await?;
//!     println!("Loaded {} tables", summary.tables_loaded);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod load;
pub mod orchestrator;
pub mod source;
pub mod storage;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use catalog::{Catalog, Column, Table};
pub use config::{Config, FilterConfig, MigrationConfig, SourceConfig, StorageConfig, TargetConfig};
pub use error::{MigrateError, Result};
pub use export::Exporter;
pub use load::Loader;
pub use orchestrator::{Orchestrator, RunSummary};
pub use source::PgSourcePool;
pub use storage::{ObjectStore, S3Store};
pub use target::{PgTargetPool, StatementLog, TargetExecutor};
