//! SQLite backend implementation.
//!
//! Each tenant owns one SQLite database file, located by the connection
//! template in [`TenantDatabaseConfig`](crate::registry::TenantDatabaseConfig).
//! [`SqlitePoolFactory`] builds an `r2d2` pool per tenant with the shared
//! [`PoolPolicy`](crate::core::PoolPolicy) and [`SqliteDriverConfig`].
//!
//! # Example
//!
//! ```no_run
//! use campus_persistence::backends::sqlite::SqlitePoolFactory;
//! use campus_persistence::registry::{TenantDatabaseConfig, TenantRegistry};
//! use campus_persistence::tenant::TenantId;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = SqlitePoolFactory::new(TenantDatabaseConfig::new().with_host("/var/lib/campus"))?;
//! let registry = TenantRegistry::new(factory);
//!
//! // Opens /var/lib/campus/school7.db on first use.
//! let pool = registry.resolve(&TenantId::new("school7")).await?;
//! pool.health_check()?;
//! # Ok(())
//! # }
//! ```

mod pool;

pub use pool::{PoolStats, SqliteConnection, SqliteDriverConfig, SqlitePoolFactory, SqliteTenantPool};

/// Registry of SQLite tenant pools.
pub type SqliteRegistry = crate::registry::TenantRegistry<SqlitePoolFactory>;
