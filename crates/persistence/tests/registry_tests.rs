//! Tenant registry integration tests against real SQLite pools.

mod common;

use std::sync::Arc;

use campus_persistence::backends::sqlite::SqlitePoolFactory;
use campus_persistence::core::PoolPolicy;
use campus_persistence::entities::ItemStore;
use campus_persistence::error::ErrorKind;
use campus_persistence::registry::{TenantDatabaseConfig, TenantRegistry};
use campus_persistence::schema::SchemaProvisioner;

use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolves_share_one_pool() {
    let harness = TestHarness::new();
    let t = tenant("school7");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = harness.registry();
            let t = t.clone();
            tokio::spawn(async move { registry.resolve(&t).await })
        })
        .collect();

    let mut pools = Vec::new();
    for handle in handles {
        pools.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(harness.registry.constructions(), 1);
    assert!(pools.iter().all(|p| Arc::ptr_eq(p, &pools[0])));
}

#[tokio::test]
async fn test_each_tenant_gets_its_own_database_file() {
    let harness = TestHarness::new();

    let a = harness.registry.resolve(&tenant("school7")).await.unwrap();
    let b = harness.registry.resolve(&tenant("school8")).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.path(), harness.dir.path().join("school7.db"));
    assert_eq!(b.path(), harness.dir.path().join("school8.db"));
    assert_eq!(
        harness.registry.tenants(),
        vec![tenant("school7"), tenant("school8")]
    );
}

#[tokio::test]
async fn test_tenant_data_is_isolated_on_disk() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let p = period("2024-25");

    items.create(&tenant("school7"), &p, &notebook()).await.unwrap();

    let other = harness.registry.resolve(&tenant("school8")).await.unwrap();
    SchemaProvisioner::provision_all(&other).unwrap();
    let conn = other.get_connection().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_unreachable_database_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    // The data directory is not mounted yet.
    let missing = dir.path().join("mount");
    let config = TenantDatabaseConfig::new()
        .with_host(missing.to_string_lossy())
        .with_pool(
            PoolPolicy::default()
                .with_min_idle(0)
                .with_connect_timeout_ms(200),
        );
    let registry = TenantRegistry::new(SqlitePoolFactory::new(config).unwrap());
    let t = tenant("school7");

    let err = registry.resolve(&t).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert!(!registry.contains(&t));

    std::fs::create_dir_all(&missing).unwrap();
    let pool = registry.resolve(&t).await.unwrap();
    assert!(pool.health_check().is_ok());
    assert_eq!(registry.constructions(), 1);
}

#[tokio::test]
async fn test_exhausted_pool_is_resource_unavailable() {
    let harness = TestHarness::with_policy(
        PoolPolicy::default()
            .with_max_size(1)
            .with_min_idle(1)
            .with_connect_timeout_ms(100),
    );
    let pool = harness.registry.resolve(&tenant("school7")).await.unwrap();

    let held = pool.get_connection().unwrap();
    let err = pool.get_connection().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);

    drop(held);
    assert!(pool.get_connection().is_ok());
}

#[tokio::test]
async fn test_shutdown_releases_pools() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    items.create(&t, &p, &notebook()).await.unwrap();
    assert_eq!(harness.registry.len(), 1);

    assert_eq!(harness.registry.shutdown(), 1);
    assert!(harness.registry.is_empty());

    let err = items.list(&t, &p).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(harness.registry.constructions(), 1);

    // Data survives for the next process.
    let factory = SqlitePoolFactory::new(
        TenantDatabaseConfig::new().with_host(harness.dir.path().to_string_lossy()),
    )
    .unwrap();
    let reopened = ItemStore::new(Arc::new(TenantRegistry::new(factory)));
    assert_eq!(reopened.list(&t, &p).await.unwrap().len(), 1);
}
