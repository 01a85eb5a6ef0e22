// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::RecordMeta;

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "book_setup_classes",
    entity: "BookSetupClass",
    columns: &[
        ColumnDef::text("standard"),
        ColumnDef::text("book_id"),
        ColumnDef::integer("quantity").required(),
        ColumnDef::real("amount").required(),
        ColumnDef::integer("total_quantity").required(),
    ],
    natural_key: &["standard", "book_id"],
    track_updates: false,
};

/// One row of a class's book allocation.
///
/// Every row of a standard carries the allocation's `total_quantity` as of
/// the last create or update that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSetupClass {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub standard: String,
    pub book_id: String,
    pub quantity: i64,
    pub amount: f64,
    pub total_quantity: i64,
}

impl BookSetupClass {
    /// Returns the table definition.
    pub fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            standard: row.get("standard")?,
            book_id: row.get("book_id")?,
            quantity: row.get("quantity")?,
            amount: row.get("amount")?,
            total_quantity: row.get("total_quantity")?,
        })
    }
}
