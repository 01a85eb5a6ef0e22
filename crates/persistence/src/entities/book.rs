// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::{ColumnValues, Entity, RecordMeta};

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "books",
    entity: "Book",
    columns: &[
        ColumnDef::text("book_name"),
        ColumnDef::real("amount").required(),
        ColumnDef::text("category"),
    ],
    natural_key: &["book_name"],
    track_updates: false,
};

/// A book in the tenant's book master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub book_name: String,
    pub amount: f64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub book_name: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Replaces every column of a book, including its name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub book_name: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl Entity for Book {
    type Draft = BookDraft;
    type Patch = BookPatch;

    fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    fn natural_key(draft: &BookDraft) -> String {
        draft.book_name.clone()
    }

    fn draft_values(draft: &BookDraft) -> ColumnValues {
        vec![
            ("book_name", Value::Text(draft.book_name.clone())),
            ("amount", Value::Real(draft.amount)),
            ("category", draft.category.clone().into()),
        ]
    }

    fn patch_values(patch: &BookPatch) -> ColumnValues {
        vec![
            ("book_name", Value::Text(patch.book_name.clone())),
            ("amount", Value::Real(patch.amount)),
            ("category", patch.category.clone().into()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            book_name: row.get("book_name")?,
            amount: row.get("amount")?,
            category: row.get("category")?,
        })
    }
}
