//! Idempotent table provisioning.

use tracing::{debug, info, warn};

use super::SchemaDefinition;
use crate::backends::sqlite::SqliteTenantPool;
use crate::entities;
use crate::error::{BackendError, StorageError, StorageResult, is_lock_contention};

/// Ensures entity tables exist in a tenant database.
///
/// `ensure` is called before every store operation. After the first success
/// for a table it only consults the pool's memo; the DDL itself is
/// `IF NOT EXISTS`, so concurrent first calls converge on the same schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaProvisioner;

impl SchemaProvisioner {
    /// Creates the table and index for `schema` if they do not exist.
    pub fn ensure(pool: &SqliteTenantPool, schema: &'static SchemaDefinition) -> StorageResult<()> {
        if pool.is_provisioned(schema.table) {
            return Ok(());
        }

        schema.check().map_err(|message| migration_error(schema, message))?;

        let conn = pool.get_connection()?;
        let ddl = format!(
            "{};\n{};",
            schema.create_table_sql(),
            schema.create_index_sql()
        );
        debug!(tenant = %pool.tenant(), table = schema.table, "Ensuring table");

        if let Err(e) = conn.execute_batch(&ddl) {
            warn!(
                tenant = %pool.tenant(),
                table = schema.table,
                error = %e,
                "Schema provisioning failed"
            );
            if is_lock_contention(&e) {
                return Err(e.into());
            }
            return Err(migration_error(schema, e.to_string()));
        }

        pool.mark_provisioned(schema.table);
        info!(tenant = %pool.tenant(), table = schema.table, "Provisioned table");
        Ok(())
    }

    /// Ensures every catalogued table, returning how many were checked.
    pub fn provision_all(pool: &SqliteTenantPool) -> StorageResult<usize> {
        let schemas = entities::catalogue();
        for schema in schemas {
            Self::ensure(pool, schema)?;
        }
        Ok(schemas.len())
    }
}

fn migration_error(schema: &SchemaDefinition, message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError {
        table: schema.table.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqlitePoolFactory;
    use crate::core::PoolFactory;
    use crate::error::ErrorKind;
    use crate::registry::TenantDatabaseConfig;
    use crate::schema::ColumnDef;
    use crate::tenant::TenantId;

    static WIDGETS: SchemaDefinition = SchemaDefinition {
        table: "widgets",
        entity: "Widget",
        columns: &[ColumnDef::text("code"), ColumnDef::text("label")],
        natural_key: &["code"],
        track_updates: true,
    };

    static BROKEN: SchemaDefinition = SchemaDefinition {
        table: "broken",
        entity: "Broken",
        columns: &[ColumnDef::text("code")],
        natural_key: &["missing"],
        track_updates: false,
    };

    async fn open_pool(dir: &tempfile::TempDir) -> SqliteTenantPool {
        let factory = SqlitePoolFactory::new(
            TenantDatabaseConfig::new().with_host(dir.path().to_string_lossy()),
        )
        .unwrap();
        factory.create(&TenantId::new("school7")).await.unwrap()
    }

    fn table_exists(pool: &SqliteTenantPool, table: &str) -> bool {
        let conn = pool.get_connection().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[tokio::test]
    async fn test_ensure_creates_table() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir).await;

        SchemaProvisioner::ensure(&pool, &WIDGETS).unwrap();
        assert!(table_exists(&pool, "widgets"));
        assert!(pool.is_provisioned("widgets"));
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir).await;

        for _ in 0..3 {
            SchemaProvisioner::ensure(&pool, &WIDGETS).unwrap();
        }
        assert!(table_exists(&pool, "widgets"));
    }

    #[tokio::test]
    async fn test_ensure_tolerates_existing_table_in_fresh_pool() {
        let dir = tempfile::tempdir().unwrap();
        let first = open_pool(&dir).await;
        SchemaProvisioner::ensure(&first, &WIDGETS).unwrap();
        drop(first);

        // A new pool has an empty memo but the table is already on disk.
        let second = open_pool(&dir).await;
        assert!(!second.is_provisioned("widgets"));
        SchemaProvisioner::ensure(&second, &WIDGETS).unwrap();
        assert!(second.is_provisioned("widgets"));
    }

    #[tokio::test]
    async fn test_unique_constraint_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir).await;
        SchemaProvisioner::ensure(&pool, &WIDGETS).unwrap();

        let conn = pool.get_connection().unwrap();
        let insert = "INSERT INTO widgets (code, label, tenant_key, period_key, created_at) \
                      VALUES (?1, 'x', 'school7', ?2, '2024-06-01')";
        conn.execute(insert, ["W1", "2024-25"]).unwrap();
        conn.execute(insert, ["W1", "2025-26"]).unwrap();
        assert!(conn.execute(insert, ["W1", "2024-25"]).is_err());
    }

    #[tokio::test]
    async fn test_invalid_definition_is_migration_error() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir).await;

        let err = SchemaProvisioner::ensure(&pool, &BROKEN).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::MigrationError { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!pool.is_provisioned("broken"));
    }

    #[tokio::test]
    async fn test_provision_all() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir).await;

        let count = SchemaProvisioner::provision_all(&pool).unwrap();
        assert_eq!(count, entities::catalogue().len());
        for schema in entities::catalogue() {
            assert!(table_exists(&pool, schema.table), "{}", schema.table);
        }
    }
}
