//! Administrative commands.
//!
//! Each command resolves the tenant through the shared registry and prints
//! its result as pretty JSON.

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use campus_persistence::backends::sqlite::SqliteRegistry;
use campus_persistence::entities::{Book, CategoryHead, CustomerStaff, Item, Supplier};
use campus_persistence::schema::SchemaProvisioner;
use campus_persistence::store::{
    Allocation, AllocationPayload, CompositeAggregateStore, Entity, RecordStore,
};
use campus_persistence::tenant::{PeriodKey, TenantId};

/// Entity kinds the tool can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Book,
    Item,
    Supplier,
    Category,
    CustomerStaff,
    /// Class book allocation rows.
    BookSetupClass,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create every entity table in a tenant database.
    Provision {
        #[arg(long)]
        tenant: String,
    },

    /// List records for a tenant and period.
    List {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        period: String,
        kind: EntityKind,
    },

    /// Create a record from a JSON payload.
    Create {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        period: String,
        kind: EntityKind,
        #[arg(long)]
        json: String,
    },

    /// Update a record from a JSON payload.
    Update {
        #[arg(long)]
        tenant: String,
        /// Required for book-setup-class and rejected for every other kind.
        #[arg(long)]
        period: Option<String>,
        kind: EntityKind,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        json: String,
    },

    /// Delete a record by id.
    Delete {
        #[arg(long)]
        tenant: String,
        kind: EntityKind,
        #[arg(long)]
        id: i64,
    },

    /// Restamp a class allocation's rows with the sum of their quantities.
    Recompute {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        period: String,
        #[arg(long)]
        standard: String,
    },
}

impl Command {
    /// Returns `true` if the command may create a missing tenant database.
    pub fn creates_tenant(&self) -> bool {
        matches!(self, Command::Provision { .. })
    }
}

enum Action {
    List {
        tenant: TenantId,
        period: PeriodKey,
    },
    Create {
        tenant: TenantId,
        period: PeriodKey,
        json: String,
    },
    Update {
        tenant: TenantId,
        period: Option<PeriodKey>,
        id: i64,
        json: String,
    },
    Delete {
        tenant: TenantId,
        id: i64,
    },
}

/// Runs one command and returns its JSON output.
pub async fn execute(command: Command, registry: Arc<SqliteRegistry>) -> anyhow::Result<Value> {
    let (kind, action) = match command {
        Command::Provision { tenant } => {
            let tenant = TenantId::new(tenant);
            let pool = registry.resolve(&tenant).await?;
            let tables = SchemaProvisioner::provision_all(&pool)?;
            info!(tenant = %tenant, tables, "Provisioned tenant database");
            return Ok(json!({
                "tenant": tenant,
                "database": pool.path().display().to_string(),
                "tables": tables,
            }));
        }
        Command::Recompute {
            tenant,
            period,
            standard,
        } => {
            let store = CompositeAggregateStore::new(registry);
            let total = store
                .recompute_total(&TenantId::new(tenant), &PeriodKey::parse(period)?, &standard)
                .await?;
            return Ok(json!({ "standard": standard, "totalQuantity": total }));
        }
        Command::List {
            tenant,
            period,
            kind,
        } => (
            kind,
            Action::List {
                tenant: TenantId::new(tenant),
                period: PeriodKey::parse(period)?,
            },
        ),
        Command::Create {
            tenant,
            period,
            kind,
            json,
        } => (
            kind,
            Action::Create {
                tenant: TenantId::new(tenant),
                period: PeriodKey::parse(period)?,
                json,
            },
        ),
        Command::Update {
            tenant,
            period,
            kind,
            id,
            json,
        } => (
            kind,
            Action::Update {
                tenant: TenantId::new(tenant),
                period: period.map(PeriodKey::parse).transpose()?,
                id,
                json,
            },
        ),
        Command::Delete { tenant, kind, id } => (
            kind,
            Action::Delete {
                tenant: TenantId::new(tenant),
                id,
            },
        ),
    };

    match kind {
        EntityKind::Book => run_record::<Book>(registry, action).await,
        EntityKind::Item => run_record::<Item>(registry, action).await,
        EntityKind::Supplier => run_record::<Supplier>(registry, action).await,
        EntityKind::Category => run_record::<CategoryHead>(registry, action).await,
        EntityKind::CustomerStaff => run_record::<CustomerStaff>(registry, action).await,
        EntityKind::BookSetupClass => run_allocation(registry, action).await,
    }
}

async fn run_record<E>(registry: Arc<SqliteRegistry>, action: Action) -> anyhow::Result<Value>
where
    E: Entity + Serialize,
    E::Draft: DeserializeOwned,
    E::Patch: DeserializeOwned,
{
    let store = RecordStore::<E>::new(registry);
    let output = match action {
        Action::List { tenant, period } => serde_json::to_value(store.list(&tenant, &period).await?)?,
        Action::Create {
            tenant,
            period,
            json,
        } => {
            let draft: E::Draft = serde_json::from_str(&json).context("invalid create payload")?;
            serde_json::to_value(store.create(&tenant, &period, &draft).await?)?
        }
        Action::Update {
            tenant,
            period,
            id,
            json,
        } => {
            if period.is_some() {
                bail!("--period is only accepted when updating book-setup-class rows");
            }
            let patch: E::Patch = serde_json::from_str(&json).context("invalid update payload")?;
            serde_json::to_value(store.update(&tenant, id, &patch).await?)?
        }
        Action::Delete { tenant, id } => {
            store.delete(&tenant, id).await?;
            json!({ "deleted": id })
        }
    };
    Ok(output)
}

async fn run_allocation(registry: Arc<SqliteRegistry>, action: Action) -> anyhow::Result<Value> {
    let store = CompositeAggregateStore::new(registry);
    let output = match action {
        Action::List { tenant, period } => serde_json::to_value(store.list(&tenant, &period).await?)?,
        Action::Create {
            tenant,
            period,
            json,
        } => {
            let allocation = parse_allocation(&json)?;
            serde_json::to_value(store.create(&tenant, &period, &allocation).await?)?
        }
        Action::Update {
            tenant,
            period,
            id,
            json,
        } => {
            let Some(period) = period else {
                bail!("--period is required to update book-setup-class rows");
            };
            let allocation = parse_allocation(&json)?;
            serde_json::to_value(store.update(&tenant, &period, id, &allocation).await?)?
        }
        Action::Delete { tenant, id } => {
            store.delete(&tenant, id).await?;
            json!({ "deleted": id })
        }
    };
    Ok(output)
}

/// Parses an allocation payload, keeping validation failures as storage errors.
fn parse_allocation(json: &str) -> anyhow::Result<Allocation> {
    let payload: AllocationPayload =
        serde_json::from_str(json).context("invalid allocation payload")?;
    Ok(Allocation::try_from(payload)?)
}
