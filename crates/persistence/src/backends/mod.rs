//! Database backend implementations.
//!
//! A backend supplies the [`PoolFactory`](crate::core::PoolFactory) the
//! tenant registry uses to open per-tenant databases.
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | SQLite | [`sqlite`] | One database file per tenant, pooled with `r2d2` |

pub mod sqlite;
