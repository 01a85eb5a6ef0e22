//! Pool construction abstraction.
//!
//! This module defines the [`PoolFactory`] trait, the seam between the
//! [`TenantRegistry`](crate::registry::TenantRegistry) and a concrete
//! database driver, and the [`PoolPolicy`] every tenant pool is built with.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::tenant::TenantId;

/// Sizing and timeout policy applied identically to every tenant pool.
///
/// The defaults keep a small number of warm connections per tenant and a
/// short connect timeout so an unreachable tenant database fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPolicy {
    /// Maximum number of connections in each tenant pool.
    #[serde(default = "default_max_size")]
    pub max_size: u32,

    /// Minimum number of idle connections kept open.
    #[serde(default = "default_min_idle")]
    pub min_idle: u32,

    /// Idle connections above `min_idle` are closed after this long.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Connections are recycled after this long regardless of use.
    #[serde(default = "default_max_lifetime_ms")]
    pub max_lifetime_ms: u64,

    /// Upper bound on building a pool or checking out a connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_size() -> u32 {
    10
}

fn default_min_idle() -> u32 {
    2
}

fn default_idle_timeout_ms() -> u64 {
    30_000
}

fn default_max_lifetime_ms() -> u64 {
    1_800_000 // 30 minutes
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            min_idle: default_min_idle(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_lifetime_ms: default_max_lifetime_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl PoolPolicy {
    /// Sets the maximum pool size.
    pub fn with_max_size(mut self, max: u32) -> Self {
        self.max_size = max;
        self
    }

    /// Sets the minimum number of idle connections.
    pub fn with_min_idle(mut self, min: u32) -> Self {
        self.min_idle = min;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    /// Returns the idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Returns the maximum connection lifetime as a [`Duration`].
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }

    /// Returns the connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns every inconsistency in this policy.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.max_size == 0 {
            errors.push("pool max_size must be at least 1".to_string());
        }
        if self.min_idle > self.max_size {
            errors.push(format!(
                "pool min_idle ({}) must not exceed max_size ({})",
                self.min_idle, self.max_size
            ));
        }
        if self.connect_timeout_ms == 0 {
            errors.push("pool connect_timeout_ms must be greater than 0".to_string());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Builds the pooled resource for one tenant.
///
/// The registry calls [`create`](Self::create) at most once per tenant for
/// every successful construction; a failed construction may be retried by a
/// later caller. Implementations must not cache pools themselves.
#[async_trait]
pub trait PoolFactory: Send + Sync + 'static {
    /// The pooled resource handed out for each tenant.
    type Pool: Send + Sync + 'static;

    /// Returns a human-readable name for the backing driver.
    fn name(&self) -> &'static str;

    /// Rejects tenant keys that cannot address a database.
    fn validate(&self, _tenant: &TenantId) -> StorageResult<()> {
        Ok(())
    }

    /// Builds a new pool for the tenant.
    async fn create(&self, tenant: &TenantId) -> StorageResult<Self::Pool>;
}
