//! Shared test infrastructure for the persistence integration tests.
//!
//! Every test builds a [`TestHarness`] over its own temporary data
//! directory, so tenant databases never leak between tests.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use campus_persistence::backends::sqlite::{SqliteDriverConfig, SqlitePoolFactory, SqliteRegistry};
use campus_persistence::core::PoolPolicy;
use campus_persistence::entities::{
    BookDraft, CategoryHeadDraft, CustomerStaffDraft, ItemDraft, SupplierDraft,
};
use campus_persistence::registry::{TenantDatabaseConfig, TenantRegistry};
use campus_persistence::tenant::{PeriodKey, TenantId};

/// A registry over an isolated temporary data directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub registry: Arc<SqliteRegistry>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_policy(PoolPolicy::default())
    }

    pub fn with_policy(policy: PoolPolicy) -> Self {
        Self::with_driver(policy, SqliteDriverConfig::default())
    }

    /// A harness whose statements give up on a locked database after `ms`.
    pub fn with_busy_timeout(ms: u64) -> Self {
        Self::with_driver(
            PoolPolicy::default(),
            SqliteDriverConfig {
                busy_timeout_ms: ms,
                ..Default::default()
            },
        )
    }

    pub fn with_driver(policy: PoolPolicy, driver: SqliteDriverConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = TenantDatabaseConfig::new()
            .with_host(dir.path().to_string_lossy())
            .with_pool(policy);
        let factory = SqlitePoolFactory::new(config)
            .expect("Failed to build pool factory")
            .with_driver(driver);
        Self {
            dir,
            registry: Arc::new(TenantRegistry::new(factory)),
        }
    }

    pub fn registry(&self) -> Arc<SqliteRegistry> {
        Arc::clone(&self.registry)
    }

    /// Opens a connection outside the registry and takes the tenant
    /// database's write lock. The lock is released when the connection drops.
    pub fn hold_write_lock(&self, tenant: &str) -> rusqlite::Connection {
        let path = self.dir.path().join(format!("{}.db", tenant));
        let conn = rusqlite::Connection::open(path).expect("Failed to open tenant database");
        conn.execute_batch("BEGIN IMMEDIATE;")
            .expect("Failed to take write lock");
        conn
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

pub fn period(key: &str) -> PeriodKey {
    PeriodKey::parse(key).expect("valid period key")
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn notebook() -> ItemDraft {
    ItemDraft::new("BK01", "Notebook").with_purchase_rate("50")
}

pub fn book(name: &str, amount: f64) -> BookDraft {
    BookDraft {
        book_name: name.to_string(),
        amount,
        category: Some("Textbook".to_string()),
    }
}

pub fn supplier(code: &str) -> SupplierDraft {
    SupplierDraft {
        supplier_code: code.to_string(),
        supplier_name: format!("Supplier {}", code),
        phone_number: Some("9876543210".to_string()),
        ..Default::default()
    }
}

pub fn category(name: &str) -> CategoryHeadDraft {
    CategoryHeadDraft {
        category_name: name.to_string(),
        account_head: Some("Stationery".to_string()),
    }
}

pub fn customer(name: &str) -> CustomerStaffDraft {
    CustomerStaffDraft {
        customer_staff_code: Some("CS01".to_string()),
        customer_staff_name: name.to_string(),
        district: Some("Chennai".to_string()),
        ..Default::default()
    }
}
