//! Process configuration for the Campus store administration tool.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CAMPUS_DATA_DIR` | data | Directory holding one database file per tenant |
//! | `CAMPUS_LOG_LEVEL` | info | Log level |
//! | `CAMPUS_POOL_MAX_SIZE` | 10 | Maximum connections per tenant pool |
//! | `CAMPUS_POOL_MIN_IDLE` | 2 | Idle connections kept per tenant pool |
//! | `CAMPUS_CONNECT_TIMEOUT_MS` | 10000 | Connection checkout timeout (ms) |
//! | `CAMPUS_IDLE_TIMEOUT_SECS` | 30 | Idle connection eviction (seconds) |
//! | `CAMPUS_MAX_LIFETIME_SECS` | 1800 | Maximum connection lifetime (seconds) |
//! | `CAMPUS_BUSY_TIMEOUT_MS` | 5000 | SQLite busy timeout (ms) |

use std::path::PathBuf;

use clap::Args;

use campus_persistence::backends::sqlite::SqliteDriverConfig;
use campus_persistence::core::PoolPolicy;
use campus_persistence::registry::TenantDatabaseConfig;

/// Storage and logging settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory holding one database file per tenant.
    #[arg(long, env = "CAMPUS_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "CAMPUS_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Maximum connections per tenant pool.
    #[arg(long, env = "CAMPUS_POOL_MAX_SIZE", default_value = "10", global = true)]
    pub pool_max_size: u32,

    /// Idle connections kept open per tenant pool.
    #[arg(long, env = "CAMPUS_POOL_MIN_IDLE", default_value = "2", global = true)]
    pub pool_min_idle: u32,

    /// Connection checkout timeout in milliseconds.
    #[arg(long, env = "CAMPUS_CONNECT_TIMEOUT_MS", default_value = "10000", global = true)]
    pub connect_timeout_ms: u64,

    /// Seconds an idle connection may live before eviction.
    #[arg(long, env = "CAMPUS_IDLE_TIMEOUT_SECS", default_value = "30", global = true)]
    pub idle_timeout_secs: u64,

    /// Maximum lifetime of a connection in seconds.
    #[arg(long, env = "CAMPUS_MAX_LIFETIME_SECS", default_value = "1800", global = true)]
    pub max_lifetime_secs: u64,

    /// SQLite busy timeout in milliseconds.
    #[arg(long, env = "CAMPUS_BUSY_TIMEOUT_MS", default_value = "5000", global = true)]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            pool_max_size: 10,
            pool_min_idle: 2,
            connect_timeout_ms: 10_000,
            idle_timeout_secs: 30,
            max_lifetime_secs: 1800,
            busy_timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.data_dir.as_os_str().is_empty() {
            errors.push("Data directory cannot be empty".to_string());
        }

        if self.busy_timeout_ms == 0 {
            errors.push("Busy timeout cannot be 0".to_string());
        }

        if self.idle_timeout_secs == 0 {
            errors.push("Idle timeout cannot be 0".to_string());
        }

        if self.max_lifetime_secs == 0 {
            errors.push("Max lifetime cannot be 0".to_string());
        }

        if let Err(policy_errors) = self.pool_policy().validate() {
            errors.extend(policy_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns the pool policy applied to every tenant.
    pub fn pool_policy(&self) -> PoolPolicy {
        PoolPolicy {
            max_size: self.pool_max_size,
            min_idle: self.pool_min_idle,
            idle_timeout_ms: self.idle_timeout_secs.saturating_mul(1000),
            max_lifetime_ms: self.max_lifetime_secs.saturating_mul(1000),
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }

    /// Returns the tenant database configuration.
    pub fn database_config(&self) -> TenantDatabaseConfig {
        TenantDatabaseConfig::new()
            .with_host(self.data_dir.to_string_lossy())
            .with_pool(self.pool_policy())
    }

    /// Returns the SQLite driver settings.
    pub fn driver_config(&self) -> SqliteDriverConfig {
        SqliteDriverConfig {
            busy_timeout_ms: self.busy_timeout_ms,
            ..Default::default()
        }
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "campus_store={level},campus_persistence={level}",
            level = level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
