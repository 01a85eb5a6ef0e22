//! Tenant-scoped pool registry.
//!
//! The [`TenantRegistry`] maps each [`TenantId`] to a lazily constructed,
//! process-lifetime pooled resource. It is an explicit object owned by the
//! process entry point and shared with stores through an `Arc`; there is no
//! global instance.
//!
//! # Construction Guarantees
//!
//! - Concurrent first-time resolves of the same tenant collapse into exactly
//!   one call to [`PoolFactory::create`]; every caller receives the same pool.
//! - Resolves of different tenants never wait on each other. The map lock is
//!   held only long enough to look up or insert an empty slot, never while a
//!   pool is being built.
//! - A failed construction leaves nothing behind, so the next resolve for that
//!   tenant retries from scratch.
//! - After [`TenantRegistry::shutdown`] every resolve fails, including one that
//!   was already constructing a pool when shutdown began.
//!
//! ```text
//! resolve(t) ──► read lock ──► slot(t) initialised? ──► yes: clone Arc
//!                    │                       │
//!                    ▼ miss                  ▼ no
//!              write lock, insert      OnceCell::get_or_try_init
//!              empty slot, unlock        (one builder, others wait)
//! ```

mod config;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::core::PoolFactory;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::tenant::TenantId;

pub use config::{TenantAddressing, TenantDatabaseConfig};

type Slot<P> = Arc<OnceCell<Arc<P>>>;

/// Registry of per-tenant pooled resources.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use campus_persistence::backends::sqlite::SqlitePoolFactory;
/// use campus_persistence::registry::{TenantDatabaseConfig, TenantRegistry};
/// use campus_persistence::tenant::TenantId;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = SqlitePoolFactory::new(TenantDatabaseConfig::new().with_host("data"))?;
/// let registry = Arc::new(TenantRegistry::new(factory));
///
/// let pool = registry.resolve(&TenantId::new("school7")).await?;
/// let again = registry.resolve(&TenantId::new("school7")).await?;
/// assert!(Arc::ptr_eq(&pool, &again));
///
/// assert_eq!(registry.shutdown(), 1);
/// assert!(registry.resolve(&TenantId::new("school7")).await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct TenantRegistry<F: PoolFactory> {
    factory: F,
    pools: RwLock<HashMap<TenantId, Slot<F::Pool>>>,
    constructions: AtomicUsize,
    closed: AtomicBool,
}

impl<F: PoolFactory> fmt::Debug for TenantRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("backend", &self.factory.name())
            .field("tenants", &self.len())
            .field("constructions", &self.constructions())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<F: PoolFactory> TenantRegistry<F> {
    /// Creates an empty registry that builds pools with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            pools: RwLock::new(HashMap::new()),
            constructions: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the pool factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the tenant's pool, constructing it on first use.
    ///
    /// Fails if the tenant key is malformed, the pool cannot be built or the
    /// registry has been shut down. No failure leaves anything cached for
    /// the tenant.
    pub async fn resolve(&self, tenant: &TenantId) -> StorageResult<Arc<F::Pool>> {
        self.factory.validate(tenant)?;

        let slot = self.slot(tenant)?;
        if let Some(pool) = slot.get() {
            debug!(tenant = %tenant, "Tenant pool cache hit");
            return Ok(Arc::clone(pool));
        }

        let built = slot
            .get_or_try_init(|| async {
                let started = Instant::now();
                match self.factory.create(tenant).await {
                    Ok(pool) => {
                        self.constructions.fetch_add(1, Ordering::Relaxed);
                        info!(
                            tenant = %tenant,
                            backend = self.factory.name(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Created tenant pool"
                        );
                        Ok(Arc::new(pool))
                    }
                    Err(e) => {
                        warn!(tenant = %tenant, error = %e, "Failed to create tenant pool");
                        Err(e)
                    }
                }
            })
            .await;

        let pool = match built {
            Ok(pool) => Arc::clone(pool),
            Err(e) => {
                self.discard_empty(tenant, &slot);
                return Err(e);
            }
        };

        // Shutdown drained the map while this pool was being built.
        if self.is_closed() {
            return Err(self.closed_error(tenant));
        }
        Ok(pool)
    }

    /// Returns the slot for a tenant, inserting an empty one on a miss.
    fn slot(&self, tenant: &TenantId) -> StorageResult<Slot<F::Pool>> {
        if let Some(slot) = self.pools.read().get(tenant) {
            return Ok(Arc::clone(slot));
        }
        let mut pools = self.pools.write();
        if self.is_closed() {
            return Err(self.closed_error(tenant));
        }
        Ok(Arc::clone(pools.entry(tenant.clone()).or_default()))
    }

    /// Removes a tenant's slot after a failed construction, unless another
    /// resolver is still waiting on it and will retry.
    fn discard_empty(&self, tenant: &TenantId, slot: &Slot<F::Pool>) {
        let mut pools = self.pools.write();
        let idle = pools.get(tenant).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !slot.initialized() && Arc::strong_count(slot) == 2
        });
        if idle {
            pools.remove(tenant);
        }
    }

    fn closed_error(&self, tenant: &TenantId) -> StorageError {
        StorageError::Backend(BackendError::Unavailable {
            backend_name: self.factory.name().to_string(),
            message: format!("tenant registry is shut down; cannot resolve {}", tenant),
        })
    }

    /// Returns the tenant's pool if it has already been constructed.
    pub fn get(&self, tenant: &TenantId) -> Option<Arc<F::Pool>> {
        self.pools
            .read()
            .get(tenant)
            .and_then(|slot| slot.get().cloned())
    }

    /// Returns `true` if the tenant has a constructed pool.
    pub fn contains(&self, tenant: &TenantId) -> bool {
        self.get(tenant).is_some()
    }

    /// Returns the number of tenants with a constructed pool.
    pub fn len(&self) -> usize {
        self.pools
            .read()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Returns `true` if no tenant pool has been constructed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tenants with a constructed pool, sorted.
    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self
            .pools
            .read()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(tenant, _)| tenant.clone())
            .collect();
        tenants.sort();
        tenants
    }

    /// Returns how many pools have been successfully constructed.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the registry, releases every cached pool and returns how many
    /// were released.
    ///
    /// Pools still checked out by in-flight operations close once those
    /// operations finish. Every later resolve fails with `ResourceUnavailable`.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<Slot<F::Pool>> = {
            let mut pools = self.pools.write();
            self.closed.store(true, Ordering::Release);
            pools.drain().map(|(_, s)| s).collect()
        };
        let released = drained.iter().filter(|slot| slot.initialized()).count();
        info!(
            backend = self.factory.name(),
            released, "Tenant registry shut down"
        );
        released
    }
}
