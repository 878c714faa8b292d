//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user is required".into()));
    }

    // Target validation: schema-only runs never touch the target, so an
    // unset URI is acceptable there.
    if !config.migration.schema_only {
        if config.target.uri.is_empty() {
            return Err(MigrateError::Config("target.uri is required".into()));
        }
        config.target.resolve()?;
    }

    // Storage validation
    if config.storage.bucket.is_empty() {
        return Err(MigrateError::Config("storage.bucket is required".into()));
    }
    if config.storage.prefix.is_empty() {
        return Err(MigrateError::Config("storage.prefix is required".into()));
    }
    if config.storage.prefix.contains('/') {
        return Err(MigrateError::Config(
            "storage.prefix must be a single path segment".into(),
        ));
    }

    // Migration config validation
    if config.migration.chunk_size_bytes == 0 {
        return Err(MigrateError::Config(
            "migration.chunk_size_bytes must be at least 1".into(),
        ));
    }
    if config.migration.drop_and_recreate && config.migration.is_dry_run() {
        return Err(MigrateError::Config(
            "migration.drop_and_recreate cannot be combined with dry_run or schema_only".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        FilterConfig, MigrationConfig, SourceConfig, StorageConfig, TargetConfig,
    };

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "app".to_string(),
                user: "replicator".to_string(),
                password: "secret".to_string(),
                ssl_mode: "require".to_string(),
            },
            target: TargetConfig {
                uri: "postgres://loader:pw@cluster:5439/warehouse".to_string(),
                user: None,
                password: None,
                database: None,
                ssl_mode: "require".to_string(),
            },
            storage: StorageConfig {
                bucket: "exports".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: "AKIA123".to_string(),
                secret_access_key: "shhh".to_string(),
                prefix: "export".to_string(),
            },
            filters: FilterConfig::default(),
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_host_rejected() {
        let mut config = valid_config();
        config.source.host = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_schema_only_needs_no_target_uri() {
        let mut config = valid_config();
        config.target.uri = String::new();
        config.migration.schema_only = true;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = valid_config();
        config.migration.chunk_size_bytes = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_drop_and_recreate_incompatible_with_dry_run() {
        let mut config = valid_config();
        config.migration.drop_and_recreate = true;
        config.migration.dry_run = true;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_multi_segment_prefix_rejected() {
        let mut config = valid_config();
        config.storage.prefix = "a/b".to_string();
        assert!(validate(&config).is_err());
    }
}
