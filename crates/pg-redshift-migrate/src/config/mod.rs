//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::Path;
use url::Url;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}

impl TargetConfig {
    /// Resolve the target URI plus overrides into host/port/db/user/password.
    pub fn resolve(&self) -> Result<ResolvedTarget> {
        let url = Url::parse(&self.uri)
            .map_err(|e| MigrateError::Config(format!("invalid target.uri: {}", e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| MigrateError::Config("target.uri has no host".into()))?
            .to_string();
        let port = url.port().unwrap_or(5439);

        let user = match &self.user {
            Some(u) => u.clone(),
            None if !url.username().is_empty() => url.username().to_string(),
            None => {
                return Err(MigrateError::Config(
                    "target user not present in URI and no override given".into(),
                ))
            }
        };

        let password = self
            .password
            .clone()
            .or_else(|| url.password().map(str::to_string))
            .unwrap_or_default();

        let database = match &self.database {
            Some(d) => d.clone(),
            None => {
                let path = url.path().trim_start_matches('/');
                if path.is_empty() {
                    return Err(MigrateError::Config(
                        "target database not present in URI and no override given".into(),
                    ));
                }
                path.to_string()
            }
        };

        Ok(ResolvedTarget {
            host,
            port,
            database,
            user,
            password,
        })
    }
}

/// Target connection parameters after URI parsing and override resolution.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ResolvedTarget {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}
