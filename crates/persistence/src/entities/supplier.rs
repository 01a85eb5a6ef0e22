// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::{ColumnValues, Entity, RecordMeta};

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "suppliers",
    entity: "Supplier",
    columns: &[
        ColumnDef::text("supplier_code"),
        ColumnDef::text("supplier_name").required(),
        ColumnDef::text("address"),
        ColumnDef::text("phone_number"),
        ColumnDef::text("email"),
        ColumnDef::text("contact_person"),
        ColumnDef::text("gst"),
        ColumnDef::text("other_details"),
    ],
    natural_key: &["supplier_code"],
    track_updates: false,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub supplier_code: String,
    pub supplier_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub gst: Option<String>,
    pub other_details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierDraft {
    pub supplier_code: String,
    pub supplier_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub gst: Option<String>,
    pub other_details: Option<String>,
}

/// Supplier fields an update may change. The supplier code is fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierPatch {
    pub supplier_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub gst: Option<String>,
    pub other_details: Option<String>,
}

impl Entity for Supplier {
    type Draft = SupplierDraft;
    type Patch = SupplierPatch;

    fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    fn natural_key(draft: &SupplierDraft) -> String {
        draft.supplier_code.clone()
    }

    fn draft_values(draft: &SupplierDraft) -> ColumnValues {
        vec![
            ("supplier_code", Value::Text(draft.supplier_code.clone())),
            ("supplier_name", Value::Text(draft.supplier_name.clone())),
            ("address", draft.address.clone().into()),
            ("phone_number", draft.phone_number.clone().into()),
            ("email", draft.email.clone().into()),
            ("contact_person", draft.contact_person.clone().into()),
            ("gst", draft.gst.clone().into()),
            ("other_details", draft.other_details.clone().into()),
        ]
    }

    fn patch_values(patch: &SupplierPatch) -> ColumnValues {
        vec![
            ("supplier_name", Value::Text(patch.supplier_name.clone())),
            ("address", patch.address.clone().into()),
            ("phone_number", patch.phone_number.clone().into()),
            ("email", patch.email.clone().into()),
            ("contact_person", patch.contact_person.clone().into()),
            ("gst", patch.gst.clone().into()),
            ("other_details", patch.other_details.clone().into()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            supplier_code: row.get("supplier_code")?,
            supplier_name: row.get("supplier_name")?,
            address: row.get("address")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
            contact_person: row.get("contact_person")?,
            gst: row.get("gst")?,
            other_details: row.get("other_details")?,
        })
    }
}
