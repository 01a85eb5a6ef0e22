//! Tenant- and period-scoped record stores.
//!
//! [`RecordStore`] is one generic CRUD implementation shared by every flat
//! entity kind. An entity plugs in by implementing [`Entity`]: a static
//! [`SchemaDefinition`], a mapping from its draft and patch payloads to
//! column values, and a mapping from a row back to the entity.
//!
//! [`CompositeAggregateStore`] handles the class book allocation, which is
//! one logical record persisted as several rows sharing a derived total.

mod composite;
mod record;
mod sql;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::SchemaDefinition;
use crate::tenant::{PeriodKey, TenantId};

pub use composite::{Allocation, AllocationEntry, AllocationPayload, CompositeAggregateStore};
pub use record::RecordStore;

/// Column values in write order, keyed by column name.
pub type ColumnValues = Vec<(&'static str, Value)>;

/// Columns every stored row carries besides its entity columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// Generated identifier, increasing with insertion order.
    pub id: i64,
    /// Tenant the row belongs to.
    pub tenant_key: TenantId,
    /// Period the row belongs to.
    pub period_key: PeriodKey,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last update time, for entities that track updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    /// Reads the envelope columns selected by
    /// [`SchemaDefinition::select_columns`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            tenant_key: row.get("tenant_key")?,
            period_key: row.get("period_key")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A flat entity kind persisted one row per record.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Payload accepted by `create`.
    type Draft: Send + Sync;

    /// Payload accepted by `update`.
    type Patch: Send + Sync;

    /// Returns the table definition.
    fn schema() -> &'static SchemaDefinition;

    /// Returns the natural key of a draft, as reported in duplicate errors.
    fn natural_key(draft: &Self::Draft) -> String;

    /// Returns the entity column values of a draft.
    fn draft_values(draft: &Self::Draft) -> ColumnValues;

    /// Returns the entity column values a patch overwrites.
    fn patch_values(patch: &Self::Patch) -> ColumnValues;

    /// Maps a row selected with the schema's select list.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
