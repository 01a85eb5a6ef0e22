//! Core abstractions shared by the registry and the backends.
//!
//! - [`PoolFactory`] - builds the pooled resource for one tenant
//! - [`PoolPolicy`] - sizing and timeouts applied to every tenant pool

mod pool;

pub use pool::{PoolFactory, PoolPolicy};
