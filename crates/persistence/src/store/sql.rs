//! Statement helpers shared by the stores.

use chrono::Utc;
use rusqlite::ffi;
use rusqlite::types::Value;

use super::ColumnValues;
use crate::error::{BackendError, ResourceError, StorageError, StorageResult, ValidationError};
use crate::schema::SchemaDefinition;

/// Returns `true` if `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Maps a write failure, turning a natural-key collision into `Duplicate`.
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    schema: &SchemaDefinition,
    key: impl FnOnce() -> String,
) -> StorageError {
    if is_unique_violation(&err) {
        StorageError::Resource(ResourceError::Duplicate {
            entity: schema.entity,
            key: key(),
        })
    } else {
        err.into()
    }
}

/// Current time in the stored timestamp format.
pub(crate) fn now() -> Value {
    Value::Text(Utc::now().to_rfc3339())
}

/// `?1, ?2, ..., ?n`
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates column values against the schema.
///
/// Every named column must exist, and required or natural-key columns must
/// not be null or blank. With `complete` set, required columns absent from
/// `values` are reported as missing too.
pub(crate) fn check_values(
    schema: &SchemaDefinition,
    values: &ColumnValues,
    complete: bool,
) -> StorageResult<()> {
    for (name, value) in values {
        let Some(column) = schema.column(name) else {
            return Err(StorageError::Backend(BackendError::QueryError {
                message: format!("{} has no column {}", schema.table, name),
            }));
        };
        let mandatory = column.required || schema.is_natural_key(name);
        if mandatory && is_blank(value) {
            return Err(missing(name));
        }
    }

    if complete {
        for column in schema.columns {
            let mandatory = column.required || schema.is_natural_key(column.name);
            if mandatory && !values.iter().any(|(name, _)| *name == column.name) {
                return Err(missing(column.name));
            }
        }
    }

    Ok(())
}

/// Describes the natural key from whichever key columns `values` carries.
pub(crate) fn describe_key(schema: &SchemaDefinition, values: &ColumnValues) -> Option<String> {
    let parts: Vec<String> = schema
        .natural_key
        .iter()
        .filter_map(|key| {
            values
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| display_value(value))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn missing(field: &str) -> StorageError {
    StorageError::Validation(ValidationError::MissingRequiredField {
        field: field.to_string(),
    })
}
