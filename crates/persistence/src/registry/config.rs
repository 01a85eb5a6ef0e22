//! Tenant database addressing.
//!
//! Every tenant database is reached through a connection string derived
//! deterministically from the tenant key. The template, the key rules and
//! the pool policy are process-wide and identical for every tenant.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::PoolPolicy;
use crate::error::{ConfigError, StorageResult, TenantError};
use crate::tenant::TenantId;

/// Configuration for locating and pooling tenant databases.
///
/// # Example
///
/// ```
/// use campus_persistence::registry::TenantDatabaseConfig;
/// use campus_persistence::tenant::TenantId;
///
/// let config = TenantDatabaseConfig::new().with_host("/var/lib/campus");
/// let addressing = config.compile().unwrap();
///
/// let path = addressing.connection_string(&TenantId::new("school7"));
/// assert_eq!(path.to_str(), Some("/var/lib/campus/school7.db"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDatabaseConfig {
    /// Connection string template.
    ///
    /// Supported placeholders:
    /// - `{host}` - The database host (for SQLite, the data directory)
    /// - `{tenant}` - The tenant key
    #[serde(default = "default_connection_template")]
    pub connection_template: String,

    /// Database host substituted for `{host}`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed tenant keys (regex pattern).
    #[serde(default = "default_tenant_id_pattern")]
    pub tenant_id_pattern: String,

    /// Maximum tenant key length.
    #[serde(default = "default_max_tenant_id_length")]
    pub max_tenant_id_length: usize,

    /// Pool policy applied to every tenant.
    #[serde(default)]
    pub pool: PoolPolicy,
}

fn default_connection_template() -> String {
    "{host}/{tenant}.db".to_string()
}

fn default_host() -> String {
    "data".to_string()
}

fn default_tenant_id_pattern() -> String {
    r"^[A-Za-z0-9][A-Za-z0-9_-]*$".to_string()
}

fn default_max_tenant_id_length() -> usize {
    64
}

impl Default for TenantDatabaseConfig {
    fn default() -> Self {
        Self {
            connection_template: default_connection_template(),
            host: default_host(),
            tenant_id_pattern: default_tenant_id_pattern(),
            max_tenant_id_length: default_max_tenant_id_length(),
            pool: PoolPolicy::default(),
        }
    }
}

impl TenantDatabaseConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the connection template.
    pub fn with_connection_template(mut self, template: impl Into<String>) -> Self {
        self.connection_template = template.into();
        self
    }

    /// Sets the pool policy.
    pub fn with_pool(mut self, pool: PoolPolicy) -> Self {
        self.pool = pool;
        self
    }

    /// Validates the pool policy and compiles the tenant key pattern.
    pub fn compile(self) -> Result<TenantAddressing, ConfigError> {
        self.pool.validate().map_err(ConfigError::PoolPolicy)?;
        let tenant_pattern = regex::Regex::new(&self.tenant_id_pattern)?;
        Ok(TenantAddressing {
            config: self,
            tenant_pattern,
        })
    }
}

/// A compiled [`TenantDatabaseConfig`].
#[derive(Debug, Clone)]
pub struct TenantAddressing {
    config: TenantDatabaseConfig,
    tenant_pattern: regex::Regex,
}

impl TenantAddressing {
    /// Returns the configuration.
    pub fn config(&self) -> &TenantDatabaseConfig {
        &self.config
    }

    /// Returns the pool policy.
    pub fn pool_policy(&self) -> &PoolPolicy {
        &self.config.pool
    }

    /// Generates the connection string for a tenant.
    ///
    /// Callers must validate the tenant first; an unvalidated key could
    /// address a path outside the host.
    pub fn connection_string(&self, tenant_id: &TenantId) -> PathBuf {
        PathBuf::from(
            self.config
                .connection_template
                .replace("{host}", &self.config.host)
                .replace("{tenant}", tenant_id.as_str()),
        )
    }

    /// Checks that a tenant key can safely name a database.
    pub fn validate_tenant(&self, tenant_id: &TenantId) -> StorageResult<()> {
        let id = tenant_id.as_str();

        if id.len() > self.config.max_tenant_id_length {
            return Err(invalid_tenant(
                id,
                format!(
                    "longer than {} characters",
                    self.config.max_tenant_id_length
                ),
            ));
        }

        if !self.tenant_pattern.is_match(id) {
            return Err(invalid_tenant(
                id,
                format!(
                    "does not match required pattern {}",
                    self.config.tenant_id_pattern
                ),
            ));
        }

        Ok(())
    }
}

fn invalid_tenant(id: &str, reason: String) -> crate::error::StorageError {
    TenantError::InvalidTenant {
        tenant_id: id.to_string(),
        reason,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn addressing() -> TenantAddressing {
        TenantDatabaseConfig::default().compile().unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = TenantDatabaseConfig::default();
        assert_eq!(config.connection_template, "{host}/{tenant}.db");
        assert_eq!(config.host, "data");
        assert_eq!(config.pool, PoolPolicy::default());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: TenantDatabaseConfig =
            serde_json::from_str(r#"{"host": "/srv/schools"}"#).unwrap();
        assert_eq!(config.host, "/srv/schools");
        assert_eq!(config.max_tenant_id_length, 64);
    }

    #[test]
    fn test_connection_string_is_deterministic() {
        let addressing = TenantDatabaseConfig::new()
            .with_host("/srv/schools")
            .compile()
            .unwrap();

        let first = addressing.connection_string(&TenantId::new("school7"));
        let second = addressing.connection_string(&TenantId::new("school7"));
        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/srv/schools/school7.db"));
    }

    #[test]
    fn test_custom_template() {
        let addressing = TenantDatabaseConfig::new()
            .with_host("db")
            .with_connection_template("{host}/tenants/{tenant}/store.sqlite")
            .compile()
            .unwrap();
        let path = addressing.connection_string(&TenantId::new("school7"));
        assert_eq!(path, PathBuf::from("db/tenants/school7/store.sqlite"));
    }

    #[test]
    fn test_validate_accepts_school_keys() {
        let addressing = addressing();
        assert!(addressing.validate_tenant(&TenantId::new("school7")).is_ok());
        assert!(addressing.validate_tenant(&TenantId::new("st-marys_2")).is_ok());
        assert!(addressing.validate_tenant(&TenantId::new("7school")).is_ok());
    }

    #[test]
    fn test_validate_rejects_path_like_keys() {
        let addressing = addressing();
        for bad in ["", "../etc", "a/b", "school 7", ".hidden", "-dash"] {
            let err = addressing.validate_tenant(&TenantId::new(bad)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "key {:?}", bad);
        }
    }

    #[test]
    fn test_validate_rejects_long_keys() {
        let addressing = addressing();
        let long = "s".repeat(65);
        let err = addressing.validate_tenant(&TenantId::new(long)).unwrap_err();
        assert!(err.to_string().contains("longer than 64"));
    }

    #[test]
    fn test_invalid_pattern_fails_to_compile() {
        let config = TenantDatabaseConfig {
            tenant_id_pattern: "([".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.compile().unwrap_err(),
            ConfigError::TenantPattern(_)
        ));
    }

    #[test]
    fn test_invalid_pool_policy_fails_to_compile() {
        let config =
            TenantDatabaseConfig::new().with_pool(PoolPolicy::default().with_max_size(0));
        assert!(matches!(
            config.compile().unwrap_err(),
            ConfigError::PoolPolicy(_)
        ));
    }
}
