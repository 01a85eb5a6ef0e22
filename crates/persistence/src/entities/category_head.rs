// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::{ColumnValues, Entity, RecordMeta};

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "categories",
    entity: "CategoryHead",
    columns: &[
        ColumnDef::text("category_name"),
        ColumnDef::text("account_head"),
    ],
    natural_key: &["category_name"],
    track_updates: false,
};

/// A spending category and the account head it posts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHead {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub category_name: String,
    pub account_head: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHeadDraft {
    pub category_name: String,
    #[serde(default)]
    pub account_head: Option<String>,
}

pub type CategoryHeadPatch = CategoryHeadDraft;

impl Entity for CategoryHead {
    type Draft = CategoryHeadDraft;
    type Patch = CategoryHeadPatch;

    fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    fn natural_key(draft: &CategoryHeadDraft) -> String {
        draft.category_name.clone()
    }

    fn draft_values(draft: &CategoryHeadDraft) -> ColumnValues {
        vec![
            ("category_name", Value::Text(draft.category_name.clone())),
            ("account_head", draft.account_head.clone().into()),
        ]
    }

    fn patch_values(patch: &CategoryHeadPatch) -> ColumnValues {
        Self::draft_values(patch)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            category_name: row.get("category_name")?,
            account_head: row.get("account_head")?,
        })
    }
}
