//! Redshift target connections and statement execution.
//!
//! Redshift speaks the PostgreSQL wire protocol, so the target side reuses
//! the same pool machinery as the source. Every mutating statement flows
//! through the [`TargetExecutor`] seam; dry-run swaps the live session for a
//! [`StatementLog`] that captures statements instead of executing them.

use crate::config::TargetConfig;
use crate::error::{MigrateError, Result};
use crate::source::build_tls_config;
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::Config as PgConfig;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info, warn};

/// Executes SQL statements against the target warehouse.
///
/// A single executor instance is bound to one session, so transaction
/// control statements (`BEGIN`/`COMMIT`/`ROLLBACK`) issued through it apply
/// to the statements around them.
#[async_trait]
pub trait TargetExecutor: Send {
    /// Execute one statement.
    async fn execute(&mut self, sql: &str) -> Result<()>;
}

/// Redshift connection pool.
pub struct PgTargetPool {
    pool: Pool,
}

impl PgTargetPool {
    /// Create a new target pool from the resolved target URI.
    pub async fn new(config: &TargetConfig, max_conns: usize) -> Result<Self> {
        let resolved = config.resolve()?;
        let mut pg_config = PgConfig::new();
        pg_config.host(&resolved.host);
        pg_config.port(resolved.port);
        pg_config.dbname(&resolved.database);
        pg_config.user(&resolved.user);
        pg_config.password(&resolved.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("Target TLS is disabled. Credentials will be transmitted in plaintext.");
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr)
                    .max_size(max_conns)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating target pool"))?
            }
            _ => {
                let tls_config = build_tls_config(&config.ssl_mode)?;
                let tls_connector = MakeRustlsConnect::new(tls_config);
                let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
                Pool::builder(mgr)
                    .max_size(max_conns)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating target pool"))?
            }
        };

        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "testing target connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to Redshift target: {}:{}/{}",
            resolved.host, resolved.port, resolved.database
        );

        Ok(Self { pool })
    }

    /// Check out one session for a sequence of related statements.
    ///
    /// The loader runs each table's swap-and-load inside one session so the
    /// transaction spans exactly that table's statements.
    pub async fn session(&self) -> Result<PgSession> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "getting target session"))?;
        Ok(PgSession { client })
    }

    /// Close all connections.
    pub fn close(&self) {
        self.pool.close();
    }
}

/// One checked-out target session.
pub struct PgSession {
    client: Object,
}

#[async_trait]
impl TargetExecutor for PgSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("Target SQL: {}", sql);
        // Simple query protocol: Redshift does not support the extended
        // protocol for utility statements like COPY from S3.
        self.client.simple_query(sql).await?;
        Ok(())
    }
}

/// Statement sink for dry-run mode.
///
/// Captures every statement verbatim and prints it instead of executing;
/// no connection is touched.
#[derive(Debug, Default)]
pub struct StatementLog {
    /// Captured statements in execution order.
    pub statements: Vec<String>,
}

impl StatementLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TargetExecutor for StatementLog {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        println!("{}", sql);
        self.statements.push(sql.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_statement_log_captures_verbatim() {
        let mut log = StatementLog::new();
        log.execute("CREATE SCHEMA IF NOT EXISTS activity_demo")
            .await
            .unwrap();
        log.execute("CREATE TABLE IF NOT EXISTS activity_demo.users (\"id\" integer)")
            .await
            .unwrap();

        assert_eq!(
            log.statements,
            vec![
                "CREATE SCHEMA IF NOT EXISTS activity_demo",
                "CREATE TABLE IF NOT EXISTS activity_demo.users (\"id\" integer)",
            ]
        );
    }
}
