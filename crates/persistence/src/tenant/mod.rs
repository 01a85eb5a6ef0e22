//! Tenant and period keys.
//!
//! Every storage operation is addressed by a [`TenantId`], which selects the
//! tenant's isolated database, and most are further scoped by a
//! [`PeriodKey`], which partitions records inside that database.
//!
//! ```
//! use campus_persistence::tenant::{PeriodKey, TenantId};
//!
//! let tenant = TenantId::new("school7");
//! let period = PeriodKey::parse("2024-25").unwrap();
//! assert_eq!(tenant.as_str(), "school7");
//! assert_eq!(period.as_str(), "2024-25");
//! ```

mod id;
mod period;

pub use id::TenantId;
pub use period::PeriodKey;
