//! Campus Store Persistence Layer
//!
//! This crate provides tenant-isolated storage for the school store back
//! office. Every tenant ("school") owns its own SQLite database; one process
//! serves many tenants concurrently without sharing connections between
//! them.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant and period keys
//! - [`core`] - Pool policy and the [`PoolFactory`](core::PoolFactory) seam
//! - [`registry`] - Lazily built, process-lifetime pool per tenant
//! - [`backends`] - SQLite pool factory
//! - [`schema`] - Table definitions and idempotent provisioning
//! - [`store`] - Generic record store and the class book allocation store
//! - [`entities`] - Book, item, supplier, category and customer/staff records
//! - [`error`] - Error types and their coarse classification
//!
//! A request flows through these in order: the registry resolves the
//! tenant's pool, the provisioner ensures the entity's table, and the store
//! runs the operation on one checked-out connection.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use campus_persistence::backends::sqlite::SqlitePoolFactory;
//! use campus_persistence::entities::{ItemDraft, ItemStore};
//! use campus_persistence::registry::{TenantDatabaseConfig, TenantRegistry};
//! use campus_persistence::tenant::{PeriodKey, TenantId};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = SqlitePoolFactory::new(TenantDatabaseConfig::new().with_host("data"))?;
//! let registry = Arc::new(TenantRegistry::new(factory));
//! let items = ItemStore::new(Arc::clone(&registry));
//!
//! let tenant = TenantId::new("school7");
//! let period = PeriodKey::parse("2024-25")?;
//!
//! let item = items
//!     .create(&tenant, &period, &ItemDraft::new("BK01", "Notebook").with_purchase_rate("50"))
//!     .await?;
//! assert_eq!(item.purchase_rate.as_deref(), Some("50"));
//!
//! // A second item with the same code in the same period is rejected.
//! assert!(items.create(&tenant, &period, &ItemDraft::new("BK01", "Pad")).await.is_err());
//!
//! registry.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Class Book Allocations
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use campus_persistence::backends::sqlite::SqliteRegistry;
//! use campus_persistence::store::{Allocation, AllocationEntry, CompositeAggregateStore};
//! use campus_persistence::tenant::{PeriodKey, TenantId};
//!
//! # async fn run(registry: Arc<SqliteRegistry>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = CompositeAggregateStore::new(registry);
//! let allocation = Allocation::new(
//!     "5th",
//!     vec![AllocationEntry::new("B1", 10, 500.0), AllocationEntry::new("B2", 5, 250.0)],
//! )?;
//!
//! let tenant = TenantId::new("school7");
//! let period = PeriodKey::parse("2024-25")?;
//! let last = store.create(&tenant, &period, &allocation).await?;
//! assert_eq!(last.total_quantity, 15);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod entities;
pub mod error;
pub mod registry;
pub mod schema;
pub mod store;
pub mod tenant;

// Re-export commonly used types at crate root
pub use error::{ErrorKind, StorageError, StorageResult};
pub use registry::{TenantDatabaseConfig, TenantRegistry};
pub use tenant::{PeriodKey, TenantId};

pub use backends::sqlite::{SqlitePoolFactory, SqliteRegistry};
pub use store::{Allocation, AllocationEntry, CompositeAggregateStore, Entity, RecordStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
