// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::{ColumnValues, Entity, RecordMeta};

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "items",
    entity: "Item",
    columns: &[
        ColumnDef::text("item_code"),
        ColumnDef::text("item_name").required(),
        ColumnDef::text("purchase_rate"),
        ColumnDef::text("item_group"),
        ColumnDef::text("unit"),
        ColumnDef::text("gst_type"),
    ],
    natural_key: &["item_code"],
    track_updates: false,
};

/// A stock item sold or issued by the school store.
///
/// The purchase rate is kept as entered (for example `"50"`), not parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub item_code: String,
    pub item_name: String,
    pub purchase_rate: Option<String>,
    #[serde(rename = "group")]
    pub item_group: Option<String>,
    pub unit: Option<String>,
    pub gst_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub item_code: String,
    pub item_name: String,
    #[serde(default)]
    pub purchase_rate: Option<String>,
    #[serde(default, rename = "group")]
    pub item_group: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub gst_type: Option<String>,
}

impl ItemDraft {
    pub fn new(item_code: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            item_code: item_code.into(),
            item_name: item_name.into(),
            ..Default::default()
        }
    }

    pub fn with_purchase_rate(mut self, rate: impl Into<String>) -> Self {
        self.purchase_rate = Some(rate.into());
        self
    }
}

/// Item fields an update may change. The item code is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub item_name: String,
    #[serde(default)]
    pub purchase_rate: Option<String>,
    #[serde(default, rename = "group")]
    pub item_group: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub gst_type: Option<String>,
}

impl Entity for Item {
    type Draft = ItemDraft;
    type Patch = ItemPatch;

    fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    fn natural_key(draft: &ItemDraft) -> String {
        draft.item_code.clone()
    }

    fn draft_values(draft: &ItemDraft) -> ColumnValues {
        vec![
            ("item_code", Value::Text(draft.item_code.clone())),
            ("item_name", Value::Text(draft.item_name.clone())),
            ("purchase_rate", draft.purchase_rate.clone().into()),
            ("item_group", draft.item_group.clone().into()),
            ("unit", draft.unit.clone().into()),
            ("gst_type", draft.gst_type.clone().into()),
        ]
    }

    fn patch_values(patch: &ItemPatch) -> ColumnValues {
        vec![
            ("item_name", Value::Text(patch.item_name.clone())),
            ("purchase_rate", patch.purchase_rate.clone().into()),
            ("item_group", patch.item_group.clone().into()),
            ("unit", patch.unit.clone().into()),
            ("gst_type", patch.gst_type.clone().into()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            item_code: row.get("item_code")?,
            item_name: row.get("item_name")?,
            purchase_rate: row.get("purchase_rate")?,
            item_group: row.get("item_group")?,
            unit: row.get("unit")?,
            gst_type: row.get("gst_type")?,
        })
    }
}
