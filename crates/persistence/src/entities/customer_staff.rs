// Entity fields mirror their table columns.
#![allow(missing_docs)]

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnDef, SchemaDefinition};
use crate::store::{ColumnValues, Entity, RecordMeta};

pub(super) static SCHEMA: SchemaDefinition = SchemaDefinition {
    table: "customer_staff",
    entity: "CustomerStaff",
    columns: &[
        ColumnDef::text("customer_staff_code"),
        ColumnDef::text("customer_staff_name"),
        ColumnDef::text("number_street_name"),
        ColumnDef::text("place_pin_code"),
        ColumnDef::text("state_id"),
        ColumnDef::text("state"),
        ColumnDef::text("district_id"),
        ColumnDef::text("district"),
        ColumnDef::text("phone_number"),
        ColumnDef::text("email"),
        ColumnDef::text("contact_person"),
    ],
    natural_key: &["customer_staff_name"],
    track_updates: true,
};

/// A customer or staff member the store sells to.
///
/// This is the only catalogue entity that records when it was last updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStaff {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub customer_staff_code: Option<String>,
    pub customer_staff_name: String,
    pub number_street_name: Option<String>,
    pub place_pin_code: Option<String>,
    pub state_id: Option<String>,
    pub state: Option<String>,
    pub district_id: Option<String>,
    pub district: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerStaffDraft {
    pub customer_staff_code: Option<String>,
    pub customer_staff_name: String,
    pub number_street_name: Option<String>,
    pub place_pin_code: Option<String>,
    pub state_id: Option<String>,
    pub state: Option<String>,
    pub district_id: Option<String>,
    pub district: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
}

pub type CustomerStaffPatch = CustomerStaffDraft;

impl Entity for CustomerStaff {
    type Draft = CustomerStaffDraft;
    type Patch = CustomerStaffPatch;

    fn schema() -> &'static SchemaDefinition {
        &SCHEMA
    }

    fn natural_key(draft: &CustomerStaffDraft) -> String {
        draft.customer_staff_name.clone()
    }

    fn draft_values(draft: &CustomerStaffDraft) -> ColumnValues {
        vec![
            ("customer_staff_code", draft.customer_staff_code.clone().into()),
            ("customer_staff_name", Value::Text(draft.customer_staff_name.clone())),
            ("number_street_name", draft.number_street_name.clone().into()),
            ("place_pin_code", draft.place_pin_code.clone().into()),
            ("state_id", draft.state_id.clone().into()),
            ("state", draft.state.clone().into()),
            ("district_id", draft.district_id.clone().into()),
            ("district", draft.district.clone().into()),
            ("phone_number", draft.phone_number.clone().into()),
            ("email", draft.email.clone().into()),
            ("contact_person", draft.contact_person.clone().into()),
        ]
    }

    fn patch_values(patch: &CustomerStaffPatch) -> ColumnValues {
        Self::draft_values(patch)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: RecordMeta::from_row(row)?,
            customer_staff_code: row.get("customer_staff_code")?,
            customer_staff_name: row.get("customer_staff_name")?,
            number_street_name: row.get("number_street_name")?,
            place_pin_code: row.get("place_pin_code")?,
            state_id: row.get("state_id")?,
            state: row.get("state")?,
            district_id: row.get("district_id")?,
            district: row.get("district")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
            contact_person: row.get("contact_person")?,
        })
    }
}
