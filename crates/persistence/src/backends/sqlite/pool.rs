//! SQLite tenant pools.

use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{PoolFactory, PoolPolicy};
use crate::error::{BackendError, ConfigError, StorageError, StorageResult};
use crate::registry::{TenantAddressing, TenantDatabaseConfig};
use crate::tenant::TenantId;

const BACKEND_NAME: &str = "sqlite";

/// A checked-out SQLite connection; returns to its pool when dropped.
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Driver settings applied to every connection of every tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteDriverConfig {
    /// SQLite busy timeout in milliseconds. Bounds how long a statement
    /// waits on another writer before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable WAL mode for better read/write concurrency.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,

    /// Create a tenant's database file when it does not exist. When off, an
    /// unknown tenant fails with `ResourceUnavailable` instead.
    #[serde(default = "default_true")]
    pub create_missing: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteDriverConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
            create_missing: true,
        }
    }
}

/// Connection statistics for one tenant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Open connections, idle or checked out.
    pub connections: u32,
    /// Open connections not currently checked out.
    pub idle_connections: u32,
}

/// The pooled resource owned by the registry for one tenant.
pub struct SqliteTenantPool {
    tenant: TenantId,
    path: PathBuf,
    pool: Pool<SqliteConnectionManager>,
    /// Tables already provisioned through this pool.
    provisioned: Mutex<HashSet<&'static str>>,
}

impl Debug for SqliteTenantPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTenantPool")
            .field("tenant", &self.tenant)
            .field("path", &self.path)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl SqliteTenantPool {
    /// Returns the tenant this pool serves.
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Returns the database file backing this pool.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks out a connection, waiting at most the pool's connect timeout.
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        self.pool.get().map_err(|e| {
            StorageError::Backend(BackendError::PoolExhausted {
                backend_name: format!("{}:{}", BACKEND_NAME, self.tenant),
                message: e.to_string(),
            })
        })
    }

    /// Returns current connection statistics.
    pub fn stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Verifies the tenant database answers a trivial query.
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |_| Ok(())).map_err(|e| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("health check failed for {}: {}", self.tenant, e),
            })
        })
    }

    pub(crate) fn is_provisioned(&self, table: &str) -> bool {
        self.provisioned.lock().contains(table)
    }

    pub(crate) fn mark_provisioned(&self, table: &'static str) {
        self.provisioned.lock().insert(table);
    }
}

/// Builds one file-backed SQLite pool per tenant.
///
/// The database file for a tenant is derived from the configured connection
/// template, so the same tenant key always reaches the same database.
#[derive(Debug, Clone)]
pub struct SqlitePoolFactory {
    addressing: TenantAddressing,
    driver: SqliteDriverConfig,
}

impl SqlitePoolFactory {
    /// Creates a factory with default driver settings.
    pub fn new(config: TenantDatabaseConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            addressing: config.compile()?,
            driver: SqliteDriverConfig::default(),
        })
    }

    /// Replaces the driver settings.
    pub fn with_driver(mut self, driver: SqliteDriverConfig) -> Self {
        self.driver = driver;
        self
    }

    /// Returns the tenant addressing rules.
    pub fn addressing(&self) -> &TenantAddressing {
        &self.addressing
    }

    /// Returns the driver settings.
    pub fn driver(&self) -> &SqliteDriverConfig {
        &self.driver
    }
}

#[async_trait]
impl PoolFactory for SqlitePoolFactory {
    type Pool = SqliteTenantPool;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn validate(&self, tenant: &TenantId) -> StorageResult<()> {
        self.addressing.validate_tenant(tenant)
    }

    async fn create(&self, tenant: &TenantId) -> StorageResult<SqliteTenantPool> {
        let path = self.addressing.connection_string(tenant);
        let policy = self.addressing.pool_policy().clone();
        let driver = self.driver.clone();
        let tenant = tenant.clone();

        // r2d2 opens the initial connections synchronously.
        tokio::task::spawn_blocking(move || build_pool(tenant, path, &policy, &driver))
            .await
            .map_err(|e| {
                StorageError::Backend(BackendError::Internal {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("pool construction task failed: {}", e),
                    source: Some(Box::new(e)),
                })
            })?
    }
}

fn build_pool(
    tenant: TenantId,
    path: PathBuf,
    policy: &PoolPolicy,
    driver: &SqliteDriverConfig,
) -> StorageResult<SqliteTenantPool> {
    let busy_timeout = Duration::from_millis(driver.busy_timeout_ms);
    let enable_wal = driver.enable_wal;
    let enable_foreign_keys = driver.enable_foreign_keys;

    let flags = if driver.create_missing {
        OpenFlags::default()
    } else {
        OpenFlags::default().difference(OpenFlags::SQLITE_OPEN_CREATE)
    };

    let manager = SqliteConnectionManager::file(&path)
        .with_flags(flags)
        .with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            if enable_foreign_keys {
                conn.pragma_update(None, "foreign_keys", true)?;
            }
            if enable_wal {
                let _mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            }
            Ok(())
        });

    let connection_failed = |message: String| {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("{} ({}): {}", tenant, path.display(), message),
        })
    };

    let pool = Pool::builder()
        .max_size(policy.max_size)
        .min_idle(Some(policy.min_idle))
        .idle_timeout(Some(policy.idle_timeout()))
        .max_lifetime(Some(policy.max_lifetime()))
        .connection_timeout(policy.connect_timeout())
        .build(manager)
        .map_err(|e| connection_failed(e.to_string()))?;

    // With min_idle = 0 the builder succeeds without ever connecting.
    {
        let conn = pool.get().map_err(|e| connection_failed(e.to_string()))?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| connection_failed(e.to_string()))?;
    }

    debug!(tenant = %tenant, path = %path.display(), "Opened tenant database");

    Ok(SqliteTenantPool {
        tenant,
        path,
        pool,
        provisioned: Mutex::new(HashSet::new()),
    })
}
