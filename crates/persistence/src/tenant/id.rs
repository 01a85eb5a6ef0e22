//! Tenant key type.
//!
//! This module defines the [`TenantId`] type, the opaque key that names a
//! tenant's isolated database.

use std::fmt;
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// An opaque tenant key.
///
/// Each tenant ("school") owns exactly one database, and its `TenantId` is
/// the only key used to find that database's pool. The key is stable for
/// the tenant's lifetime.
///
/// Construction is infallible; whether a key can address a database is
/// decided by [`TenantAddressing::validate_tenant`](crate::registry::TenantAddressing::validate_tenant)
/// when the key reaches the registry.
///
/// # Examples
///
/// ```
/// use campus_persistence::tenant::TenantId;
///
/// let tenant = TenantId::new("school7");
/// assert_eq!(tenant.as_str(), "school7");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant key from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToSql for TenantId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.0.as_bytes())))
    }
}

impl FromSql for TenantId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(TenantId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_creation() {
        let tenant = TenantId::new("school7");
        assert_eq!(tenant.as_str(), "school7");
        assert_eq!(tenant.to_string(), "school7");
        assert_eq!(format!("{:?}", tenant), "TenantId(school7)");
    }

    #[test]
    fn test_serde_roundtrip() {
        let tenant = TenantId::new("school7");
        let json = serde_json::to_string(&tenant).unwrap();
        assert_eq!(json, "\"school7\"");

        let parsed: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tenant);
    }

    #[test]
    fn test_from_string() {
        let tenant: TenantId = "school7".into();
        assert_eq!(tenant.as_str(), "school7");

        let tenant2: TenantId = String::from("school7").into();
        assert_eq!(tenant2, tenant);
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut tenants = vec![TenantId::new("b"), TenantId::new("a")];
        tenants.sort();
        assert_eq!(tenants[0].as_str(), "a");
    }
}
