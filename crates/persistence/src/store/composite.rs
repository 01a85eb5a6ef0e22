//! Class book allocations.
//!
//! An allocation assigns books to a standard ("5th", "LKG", ...). It is one
//! logical record, stored as one `book_setup_classes` row per book, and
//! every row written for an allocation carries the allocation's total
//! quantity.
//!
//! Two operations touch single rows and leave sibling totals alone:
//!
//! - [`CompositeAggregateStore::update`] deletes only the row it is given
//!   before writing the new entry set.
//! - [`CompositeAggregateStore::delete`] removes one row.
//!
//! After either, surviving siblings keep the total they were written with
//! until [`CompositeAggregateStore::recompute_total`] is called.

use std::fmt;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Transaction, TransactionBehavior, params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::sql::{map_write_error, now, placeholders};
use crate::backends::sqlite::{SqliteRegistry, SqliteTenantPool};
use crate::entities::BookSetupClass;
use crate::error::{StorageError, StorageResult};
use crate::schema::SchemaProvisioner;
use crate::tenant::{PeriodKey, TenantId};

/// One book in an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    /// Book master reference.
    pub book_id: String,
    /// Copies allocated; must be positive.
    pub quantity: i64,
    /// Amount for this book; must be positive.
    pub amount: f64,
}

impl AllocationEntry {
    /// Creates an entry. Validation happens in [`Allocation::new`].
    pub fn new(book_id: impl Into<String>, quantity: i64, amount: f64) -> Self {
        Self {
            book_id: book_id.into(),
            quantity,
            amount,
        }
    }
}

/// A validated allocation of books to a standard.
///
/// Construction is the only way to obtain one, so every allocation the
/// store writes has a non-blank standard, at least one entry, positive
/// quantities and amounts, and a total equal to the sum of its quantities.
///
/// # Examples
///
/// ```
/// use campus_persistence::store::{Allocation, AllocationEntry};
///
/// let allocation = Allocation::new(
///     "5th",
///     vec![
///         AllocationEntry::new("B1", 10, 500.0),
///         AllocationEntry::new("B2", 5, 250.0),
///     ],
/// )
/// .unwrap();
/// assert_eq!(allocation.total_quantity(), 15);
///
/// assert!(Allocation::new("5th", vec![]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AllocationPayload")]
pub struct Allocation {
    standard: String,
    #[serde(rename = "books")]
    entries: Vec<AllocationEntry>,
    total_quantity: i64,
}

/// Wire shape of an allocation before validation.
///
/// `totalQuantity` is derived, never accepted. Convert with `TryFrom` to get
/// validation failures as a [`StorageError`] rather than a serde error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPayload {
    /// Class standard.
    #[serde(default)]
    pub standard: String,
    /// Book entries.
    #[serde(default, alias = "entries")]
    pub books: Vec<AllocationEntry>,
}

impl TryFrom<AllocationPayload> for Allocation {
    type Error = StorageError;

    fn try_from(payload: AllocationPayload) -> Result<Self, Self::Error> {
        Allocation::new(payload.standard, payload.books)
    }
}

impl Allocation {
    /// Validates an allocation and computes its total quantity.
    pub fn new(standard: impl Into<String>, entries: Vec<AllocationEntry>) -> StorageResult<Self> {
        let standard = standard.into();
        if standard.trim().is_empty() {
            return Err(StorageError::invalid_input("standard", "must not be blank"));
        }
        if entries.is_empty() {
            return Err(StorageError::invalid_input(
                "books",
                "at least one book entry is required",
            ));
        }

        let mut total_quantity: i64 = 0;
        for (i, entry) in entries.iter().enumerate() {
            if entry.book_id.trim().is_empty() {
                return Err(StorageError::invalid_input(
                    format!("books[{}].bookId", i),
                    "must not be blank",
                ));
            }
            if entry.quantity <= 0 {
                return Err(StorageError::invalid_input(
                    format!("books[{}].quantity", i),
                    format!("must be positive, got {}", entry.quantity),
                ));
            }
            if entry.amount.is_nan() || entry.amount <= 0.0 {
                return Err(StorageError::invalid_input(
                    format!("books[{}].amount", i),
                    format!("must be positive, got {}", entry.amount),
                ));
            }
            total_quantity = total_quantity.checked_add(entry.quantity).ok_or_else(|| {
                StorageError::invalid_input("books", "total quantity overflows")
            })?;
        }

        Ok(Self {
            standard,
            entries,
            total_quantity,
        })
    }

    /// The class or grade, e.g. `"5th"`.
    pub fn standard(&self) -> &str {
        &self.standard
    }

    /// The book entries in write order.
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Sum of the entry quantities.
    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }
}

/// Store for class book allocations.
///
/// Writes run in `BEGIN IMMEDIATE` transactions, so writers to the same
/// tenant database are serialised and a row set is committed whole or not
/// at all.
#[derive(Clone)]
pub struct CompositeAggregateStore {
    registry: Arc<SqliteRegistry>,
}

impl fmt::Debug for CompositeAggregateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAggregateStore")
            .field("table", &BookSetupClass::schema().table)
            .finish_non_exhaustive()
    }
}

impl CompositeAggregateStore {
    /// Creates a store backed by `registry`.
    pub fn new(registry: Arc<SqliteRegistry>) -> Self {
        Self { registry }
    }

    async fn pool(&self, tenant: &TenantId) -> StorageResult<Arc<SqliteTenantPool>> {
        let pool = self.registry.resolve(tenant).await?;
        SchemaProvisioner::ensure(&pool, BookSetupClass::schema())?;
        Ok(pool)
    }

    /// Writes one row per entry, all stamped with the allocation total.
    ///
    /// Returns the last row written. Fails with `DuplicateEntity` if any
    /// book is already allocated to the standard for this tenant and
    /// period, in which case nothing is written.
    #[instrument(skip(self, tenant, period, allocation), fields(tenant = %tenant, period = %period, standard = allocation.standard()))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
        allocation: &Allocation,
    ) -> StorageResult<BookSetupClass> {
        let pool = self.pool(tenant).await?;
        let mut conn = pool.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let last_id = insert_entries(&tx, tenant, period, allocation)?;
        let row = fetch(&tx, tenant, last_id)?
            .ok_or_else(|| StorageError::not_found(BookSetupClass::schema().entity, last_id))?;
        tx.commit()?;

        info!(
            rows = allocation.entries().len(),
            total_quantity = allocation.total_quantity(),
            "Created book allocation"
        );
        Ok(row)
    }

    /// Deletes row `id`, then writes the full entry set of `allocation`.
    ///
    /// Fails with `NotFound` if the row does not exist. Other rows of the
    /// standard are not removed; if one of them shares a book with the new
    /// entry set the update fails with `DuplicateEntity`. Either failure
    /// rolls back the delete.
    #[instrument(skip(self, tenant, period, allocation), fields(tenant = %tenant, period = %period, standard = allocation.standard()))]
    pub async fn update(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
        id: i64,
        allocation: &Allocation,
    ) -> StorageResult<BookSetupClass> {
        let schema = BookSetupClass::schema();
        let pool = self.pool(tenant).await?;
        let mut conn = pool.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND tenant_key = ?2", schema.table),
            params![id, tenant],
        )?;
        if removed == 0 {
            return Err(StorageError::not_found(schema.entity, id));
        }

        let last_id = insert_entries(&tx, tenant, period, allocation)?;
        let row = fetch(&tx, tenant, last_id)?
            .ok_or_else(|| StorageError::not_found(schema.entity, last_id))?;
        tx.commit()?;

        info!(
            rows = allocation.entries().len(),
            total_quantity = allocation.total_quantity(),
            "Replaced book allocation row"
        );
        Ok(row)
    }

    /// Deletes the single row `id`.
    ///
    /// The remaining rows of the standard keep their stored total; call
    /// [`recompute_total`](Self::recompute_total) to restamp them.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn delete(&self, tenant: &TenantId, id: i64) -> StorageResult<()> {
        let schema = BookSetupClass::schema();
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND tenant_key = ?2", schema.table),
            params![id, tenant],
        )?;
        if rows == 0 {
            return Err(StorageError::not_found(schema.entity, id));
        }

        debug!(id, "Deleted book allocation row; sibling totals unchanged");
        Ok(())
    }

    /// Lists every allocation row for the period, grouped by standard.
    pub async fn list(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
    ) -> StorageResult<Vec<BookSetupClass>> {
        let schema = BookSetupClass::schema();
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_key = ?1 AND period_key = ?2 ORDER BY standard, id",
            schema.select_columns(),
            schema.table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![tenant, period], BookSetupClass::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Lists the rows of one standard in insertion order.
    pub async fn rows_for_standard(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
        standard: &str,
    ) -> StorageResult<Vec<BookSetupClass>> {
        let schema = BookSetupClass::schema();
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;

        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_key = ?1 AND period_key = ?2 AND standard = ?3 ORDER BY id",
            schema.select_columns(),
            schema.table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![tenant, period, standard], BookSetupClass::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fetches one allocation row by id.
    pub async fn get(&self, tenant: &TenantId, id: i64) -> StorageResult<Option<BookSetupClass>> {
        let pool = self.pool(tenant).await?;
        let conn = pool.get_connection()?;
        fetch(&conn, tenant, id)
    }

    /// Restamps every row of `standard` with the sum of their quantities.
    ///
    /// Returns the new total, which is zero when the standard has no rows.
    #[instrument(skip(self, tenant, period), fields(tenant = %tenant, period = %period))]
    pub async fn recompute_total(
        &self,
        tenant: &TenantId,
        period: &PeriodKey,
        standard: &str,
    ) -> StorageResult<i64> {
        let schema = BookSetupClass::schema();
        let pool = self.pool(tenant).await?;
        let mut conn = pool.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let scope = "tenant_key = ?1 AND period_key = ?2 AND standard = ?3";
        let total: i64 = tx.query_row(
            &format!(
                "SELECT COALESCE(SUM(quantity), 0) FROM {} WHERE {}",
                schema.table, scope
            ),
            params![tenant, period, standard],
            |row| row.get(0),
        )?;
        let rows = tx.execute(
            &format!(
                "UPDATE {} SET total_quantity = ?4 WHERE {}",
                schema.table, scope
            ),
            params![tenant, period, standard, total],
        )?;
        tx.commit()?;

        info!(rows, total_quantity = total, "Recomputed allocation total");
        Ok(total)
    }
}

/// Inserts every entry of `allocation`, returning the id of the last row.
fn insert_entries(
    tx: &Transaction<'_>,
    tenant: &TenantId,
    period: &PeriodKey,
    allocation: &Allocation,
) -> StorageResult<i64> {
    let schema = BookSetupClass::schema();
    let sql = format!(
        "INSERT INTO {} (standard, book_id, quantity, amount, total_quantity, tenant_key, period_key, created_at) \
         VALUES ({})",
        schema.table,
        placeholders(1, 8)
    );
    let mut stmt = tx.prepare(&sql)?;
    let created_at = now();

    let mut last_id = 0;
    for entry in allocation.entries() {
        let values = [
            Value::Text(allocation.standard().to_string()),
            Value::Text(entry.book_id.clone()),
            Value::Integer(entry.quantity),
            Value::Real(entry.amount),
            Value::Integer(allocation.total_quantity()),
            Value::Text(tenant.as_str().to_string()),
            Value::Text(period.as_str().to_string()),
            created_at.clone(),
        ];
        last_id = stmt
            .insert(params_from_iter(values))
            .map_err(|e| {
                map_write_error(e, schema, || {
                    format!("{}/{}", allocation.standard(), entry.book_id)
                })
            })?;
    }
    Ok(last_id)
}

fn fetch(
    conn: &rusqlite::Connection,
    tenant: &TenantId,
    id: i64,
) -> StorageResult<Option<BookSetupClass>> {
    let schema = BookSetupClass::schema();
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1 AND tenant_key = ?2",
        schema.select_columns(),
        schema.table
    );
    Ok(conn
        .query_row(&sql, params![id, tenant], BookSetupClass::from_row)
        .optional()?)
}
