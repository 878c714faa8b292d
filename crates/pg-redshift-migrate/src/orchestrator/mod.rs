//! Replication orchestrator - main workflow coordinator.
//!
//! Drives the fully sequential pipeline: one schema at a time, one table at
//! a time, one chunk at a time. The orchestrator owns the source pool, the
//! target pool, and the object store, and passes them into the catalog,
//! exporter, and loader; connections are closed explicitly when the run
//! completes.

use crate::catalog::{Catalog, Table};
use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::export::Exporter;
use crate::load::Loader;
use crate::source::PgSourcePool;
use crate::storage::{ObjectStore, S3Store};
use crate::target::{PgTargetPool, StatementLog, TargetExecutor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Replication orchestrator.
pub struct Orchestrator {
    config: Config,
    source: PgSourcePool,
    target: Option<PgTargetPool>,
    store: Option<S3Store>,
}

/// Result of a replication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Schemas processed.
    pub schemas_total: usize,

    /// Tables discovered and prepared.
    pub tables_total: usize,

    /// Tables exported and loaded.
    pub tables_loaded: usize,

    /// Chunks uploaded to object storage.
    pub chunks_uploaded: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create a new orchestrator and open the connections the configured
    /// modes require.
    ///
    /// Dry runs (including schema-only) open no target connection and no
    /// object store; the object store is only needed when data actually
    /// moves.
    pub async fn new(config: Config) -> Result<Self> {
        let source = PgSourcePool::new(&config.source, 2).await?;

        let dry_run = config.migration.is_dry_run();
        let target = if dry_run {
            None
        } else {
            Some(PgTargetPool::new(&config.target, 2).await?)
        };

        let store = if !dry_run && config.migration.migrate {
            Some(S3Store::new(&config.storage).await?)
        } else {
            None
        };

        Ok(Self {
            config,
            source,
            target,
            store,
        })
    }

    /// Run the replication.
    pub async fn run(self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let dry_run = self.config.migration.is_dry_run();
        let migrate = self.config.migration.migrate && !dry_run;

        let catalog = Catalog::new(&self.source, &self.config.filters);

        let schemas = catalog.schemas().await?;
        if schemas.is_empty() {
            // An empty intersection is a legitimate "nothing to do" run.
            info!("No schemas selected; nothing to do");
        }

        // All DDL flows through one executor: a live session, or a
        // statement log that prints instead of executing.
        let mut ddl: Box<dyn TargetExecutor> = match &self.target {
            Some(pool) => Box::new(pool.session().await?),
            None => Box::new(StatementLog::new()),
        };

        let mut tables_total = 0usize;
        let mut tables_loaded = 0usize;
        let mut chunks_uploaded = 0usize;

        for schema in &schemas {
            self.prepare_schema(ddl.as_mut(), schema).await?;

            let tables = catalog.tables(schema).await?;
            if tables.is_empty() {
                info!("No tables selected in schema {}", schema);
            }

            for table in &tables {
                tables_total += 1;
                ddl.execute(&table.create_if_not_exists_ddl()).await?;

                if migrate {
                    let chunks = self.migrate_table(table).await?;
                    chunks_uploaded += chunks;
                    tables_loaded += 1;
                }
            }
        }

        self.close();

        let completed_at = Utc::now();
        let summary = RunSummary {
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            schemas_total: schemas.len(),
            tables_total,
            tables_loaded,
            chunks_uploaded,
            dry_run,
        };

        info!(
            "Run complete: {} schema(s), {} table(s), {} loaded, {} chunk(s) in {:.1}s",
            summary.schemas_total,
            summary.tables_total,
            summary.tables_loaded,
            summary.chunks_uploaded,
            summary.duration_seconds
        );

        Ok(summary)
    }

    /// Ensure the target schema exists, recreating it first when the
    /// destructive flag is set.
    ///
    /// `drop_and_recreate` operates per selected schema (`DROP SCHEMA ...
    /// CASCADE`), not on the target database itself; schemas outside the
    /// selection are untouched.
    async fn prepare_schema(&self, ddl: &mut dyn TargetExecutor, schema: &str) -> Result<()> {
        if self.config.migration.drop_and_recreate {
            warn!("Dropping target schema {} (drop_and_recreate)", schema);
            ddl.execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
                .await?;
            ddl.execute(&format!("CREATE SCHEMA {}", schema)).await?;
        } else {
            ddl.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
                .await?;
        }
        Ok(())
    }

    /// Export one table to object storage, then load it into the target.
    ///
    /// Returns the number of chunks uploaded. Only called on non-dry runs,
    /// so the target pool and object store are present.
    async fn migrate_table(&self, table: &Table) -> Result<usize> {
        let store = self.store.as_ref().ok_or_else(|| {
            MigrateError::Config("migrate mode requires an object store".into())
        })?;
        let target = self.target.as_ref().ok_or_else(|| {
            MigrateError::Config("migrate mode requires a target connection".into())
        })?;

        let exporter = Exporter::new(
            &self.source,
            store,
            &self.config.storage.prefix,
            self.config.migration.chunk_size_bytes,
        );
        let chunk_keys = exporter.export(table).await?;

        let loader = Loader::new(
            store.bucket(),
            &self.config.storage.prefix,
            &self.config.storage.access_key_id,
            &self.config.storage.secret_access_key,
        );

        // One session per table: the load transaction never spans tables.
        let mut session = target.session().await?;
        loader.load(&mut session, table, &chunk_keys).await?;

        Ok(chunk_keys.len())
    }

    /// Close all connections.
    fn close(&self) {
        self.source.close();
        if let Some(target) = &self.target {
            target.close();
        }
    }
}
