//! Table definitions and idempotent provisioning.
//!
//! Every entity kind owns a `'static` [`SchemaDefinition`] describing its
//! table. The definition renders the DDL; the [`SchemaProvisioner`] runs it
//! against a tenant pool before the first operation that touches the table.
//!
//! Rendered tables share a fixed envelope around the entity columns:
//!
//! ```text
//! id          INTEGER PRIMARY KEY AUTOINCREMENT
//! <entity columns>
//! tenant_key  TEXT NOT NULL
//! period_key  TEXT NOT NULL
//! created_at  TEXT NOT NULL
//! updated_at  TEXT                -- only when track_updates
//! UNIQUE (<natural key>, tenant_key, period_key)
//! ```

mod provisioner;

use std::fmt::Write;

pub use provisioner::SchemaProvisioner;

/// SQLite storage class of an entity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
}

impl ColumnType {
    /// Returns the SQL type name.
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

/// One entity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: &'static str,
    /// Storage class.
    pub column_type: ColumnType,
    /// Rendered `NOT NULL`; blank values are rejected before writing.
    pub required: bool,
}

impl ColumnDef {
    /// An optional text column.
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Text,
            required: false,
        }
    }

    /// An optional integer column.
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Integer,
            required: false,
        }
    }

    /// An optional real column.
    pub const fn real(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Real,
            required: false,
        }
    }

    /// Marks the column as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Describes the table backing one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDefinition {
    /// Table name.
    pub table: &'static str,
    /// Entity name used in error messages.
    pub entity: &'static str,
    /// Entity columns, excluding the envelope columns.
    pub columns: &'static [ColumnDef],
    /// Natural-key columns; unique together with tenant and period.
    pub natural_key: &'static [&'static str],
    /// Whether the table carries an `updated_at` column.
    pub track_updates: bool,
}

impl SchemaDefinition {
    /// Looks up an entity column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if `name` is part of the natural key.
    pub fn is_natural_key(&self, name: &str) -> bool {
        self.natural_key.contains(&name)
    }

    /// Returns the name of the natural-key constraint.
    pub fn constraint_name(&self) -> String {
        format!("uq_{}_natural_key", self.table)
    }

    /// Renders the `CREATE TABLE IF NOT EXISTS` statement.
    pub fn create_table_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT",
            self.table
        );

        for column in self.columns {
            let _ = write!(sql, ",\n    {} {}", column.name, column.column_type.as_sql());
            // SQLite treats NULLs as distinct in UNIQUE, so key columns must be set.
            if column.required || self.is_natural_key(column.name) {
                sql.push_str(" NOT NULL");
            }
        }

        sql.push_str(",\n    tenant_key TEXT NOT NULL");
        sql.push_str(",\n    period_key TEXT NOT NULL");
        sql.push_str(",\n    created_at TEXT NOT NULL");
        if self.track_updates {
            sql.push_str(",\n    updated_at TEXT");
        }

        let _ = write!(
            sql,
            ",\n    CONSTRAINT {} UNIQUE ({}, tenant_key, period_key)\n)",
            self.constraint_name(),
            self.natural_key.join(", ")
        );
        sql
    }

    /// Renders the tenant/period lookup index.
    pub fn create_index_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_tenant_period ON {table} (tenant_key, period_key)",
            table = self.table
        )
    }

    /// Renders the select list shared by every read of this table.
    ///
    /// Tables without update tracking still yield an `updated_at` column so
    /// rows map uniformly.
    pub fn select_columns(&self) -> String {
        let mut columns = vec!["id"];
        columns.extend(self.columns.iter().map(|c| c.name));
        columns.extend(["tenant_key", "period_key", "created_at"]);
        columns.push(if self.track_updates {
            "updated_at"
        } else {
            "NULL AS updated_at"
        });
        columns.join(", ")
    }

    /// Checks internal consistency of the definition.
    pub fn check(&self) -> Result<(), String> {
        if self.natural_key.is_empty() {
            return Err(format!("{}: natural key is empty", self.table));
        }
        for key in self.natural_key {
            if self.column(key).is_none() {
                return Err(format!(
                    "{}: natural key column {} is not a column",
                    self.table, key
                ));
            }
        }
        Ok(())
    }
}
