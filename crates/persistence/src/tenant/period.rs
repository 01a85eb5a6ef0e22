//! Period key type.

use std::fmt;

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{StorageResult, TenantError};

/// The secondary partition of a tenant's records, typically an academic
/// year such as `"2024-25"`.
///
/// Every record belongs to exactly one `(tenant, period)` pair, and natural
/// keys only have to be unique within that pair.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Parses a period key, rejecting blank input.
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_persistence::tenant::PeriodKey;
    ///
    /// assert!(PeriodKey::parse("2024-25").is_ok());
    /// assert!(PeriodKey::parse("  ").is_err());
    /// ```
    pub fn parse(period: impl Into<String>) -> StorageResult<Self> {
        let period = period.into();
        if period.trim().is_empty() {
            return Err(TenantError::InvalidPeriod { period }.into());
        }
        Ok(Self(period))
    }

    /// Returns the period key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeriodKey({})", self.0)
    }
}

impl AsRef<str> for PeriodKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToSql for PeriodKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.0.as_bytes())))
    }
}

impl FromSql for PeriodKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(PeriodKey)
    }
}
