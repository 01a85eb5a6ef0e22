//! Generic CRUD over a flat entity table.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::{OptionalExtension, params_from_iter};
use rusqlite::types::Value;
use tracing::{debug, instrument};

use super::Entity;
use super::sql::{check_values, describe_key, map_write_error, now, placeholders};
use crate::backends::sqlite::{SqliteRegistry, SqliteTenantPool};
use crate::error::{StorageError, StorageResult};
use crate::schema::SchemaProvisioner;
use crate::tenant::{PeriodKey, TenantId};

/// CRUD store for one entity kind.
///
/// The store holds no per-tenant state. Each call resolves the tenant's pool
/// from the shared registry, ensures the table exists and checks out one
/// connection for the duration of the call.
pub struct RecordStore<E: Entity> {
    registry: Arc<SqliteRegistry>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for RecordStore<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for RecordStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &E::schema().table)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> RecordStore<E> {
    /// Creates a store backed by `registry`.
    pub fn new(registry: Arc<SqliteRegistry>) -> Self {
        Self {
            registry,
            _entity: PhantomData,
        }
    }

    async fn pool(&self, tenant: &TenantId) -> StorageResult<Arc<SqliteTenantPool>> {
        let pool = self.registry.resolve(tenant).await?;
        SchemaProvisioner::ensure(&pool, E::schema())?;
        Ok(pool)
    }

    /// Lists the tenant's records for `period`, most recent first.
    #[instrument(skip(self, tenant, period), fields(table = E::schema().table, tenant = %tenant, period = %period))]
    pub async fn list(&self, tenant: &TenantId, period: &PeriodKey) -> StorageResult<Vec<E>> {
        let schema = E::schema();
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_key = ?1 AND period_key = ?2 ORDER BY id DESC",
            schema.select_columns(),
            schema.table
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params![tenant, period], |row| E::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = records.len(), "Listed records");
        Ok(records)
    }

    /// Fetches one record by id.
    pub async fn get(&self, tenant: &TenantId, id: i64) -> StorageResult<Option<E>> {
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;
        fetch::<E>(&conn, tenant, id)
    }

    /// Inserts a record.
    ///
    /// Fails with `DuplicateEntity` if the natural key is already taken for
    /// the tenant and period; the existing row is left untouched.
    #[instrument(skip(self, tenant, period, draft), fields(table = E::schema().table, tenant = %tenant, period = %period))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
        draft: &E::Draft,
    ) -> StorageResult<E> {
        let schema = E::schema();
        let values = E::draft_values(draft);
        check_values(schema, &values, true)?;

        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let mut columns: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
        columns.extend(["tenant_key", "period_key", "created_at"]);
        let mut params: Vec<Value> = values.into_iter().map(|(_, value)| value).collect();
        params.push(Value::Text(tenant.as_str().to_string()));
        params.push(Value::Text(period.as_str().to_string()));
        params.push(now());

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            columns.join(", "),
            placeholders(1, params.len())
        );
        conn.execute(&sql, params_from_iter(params))
            .map_err(|e| map_write_error(e, schema, || E::natural_key(draft)))?;

        let id = conn.last_insert_rowid();
        debug!(id, "Created record");

        fetch::<E>(&conn, tenant, id)?.ok_or_else(|| StorageError::not_found(schema.entity, id))
    }

    /// Overwrites the patch columns of record `id`.
    ///
    /// Fails with `NotFound` if the tenant has no such record. Natural-key
    /// uniqueness is not pre-checked; a collision still surfaces as
    /// `DuplicateEntity` from the table constraint.
    #[instrument(skip(self, tenant, patch), fields(table = E::schema().table, tenant = %tenant))]
    pub async fn update(&self, tenant: &TenantId, id: i64, patch: &E::Patch) -> StorageResult<E> {
        let schema = E::schema();
        let values = E::patch_values(patch);
        check_values(schema, &values, false)?;

        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let key = describe_key(schema, &values);
        let mut assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        let mut params: Vec<Value> = values.into_iter().map(|(_, value)| value).collect();
        if schema.track_updates {
            params.push(now());
            assignments.push(format!("updated_at = ?{}", params.len()));
        }

        if assignments.is_empty() {
            return fetch::<E>(&conn, tenant, id)?
                .ok_or_else(|| StorageError::not_found(schema.entity, id));
        }

        params.push(Value::Integer(id));
        params.push(Value::Text(tenant.as_str().to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{} AND tenant_key = ?{}",
            schema.table,
            assignments.join(", "),
            params.len() - 1,
            params.len()
        );

        let rows = conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| map_write_error(e, schema, || key.unwrap_or_else(|| format!("id {}", id))))?;
        if rows == 0 {
            return Err(StorageError::not_found(schema.entity, id));
        }

        debug!(id, "Updated record");
        fetch::<E>(&conn, tenant, id)?.ok_or_else(|| StorageError::not_found(schema.entity, id))
    }

    /// Deletes record `id`, failing with `NotFound` if it does not exist.
    #[instrument(skip(self, tenant), fields(table = E::schema().table, tenant = %tenant))]
    pub async fn delete(&self, tenant: &TenantId, id: i64) -> StorageResult<()> {
        let schema = E::schema();
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND tenant_key = ?2", schema.table),
            rusqlite::params![id, tenant],
        )?;
        if rows == 0 {
            return Err(StorageError::not_found(schema.entity, id));
        }

        debug!(id, "Deleted record");
        Ok(())
    }
}

fn fetch<E: Entity>(
    conn: &rusqlite::Connection,
    tenant: &TenantId,
    id: i64,
) -> StorageResult<Option<E>> {
    let schema = E::schema();
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1 AND tenant_key = ?2",
        schema.select_columns(),
        schema.table
    );
    Ok(conn
        .query_row(&sql, rusqlite::params![id, tenant], |row| E::from_row(row))
        .optional()?)
}
