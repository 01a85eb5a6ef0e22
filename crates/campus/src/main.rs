//! Campus Store administration tool.
//!
//! Provisions tenant databases and manages store records from the command
//! line. The process owns the tenant registry: it builds it once, hands it
//! to every store and shuts it down before exiting.

mod commands;
mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use campus_persistence::TenantRegistry;
use campus_persistence::backends::sqlite::{SqliteDriverConfig, SqlitePoolFactory};
use campus_persistence::error::StorageError;

use crate::commands::{Command, execute};
use crate::config::{StoreConfig, init_logging};

#[derive(Debug, Parser)]
#[command(name = "campus-store")]
#[command(about = "Campus store tenant database administration")]
struct Cli {
    #[command(flatten)]
    config: StoreConfig,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(data_dir = %cli.config.data_dir.display(), "Starting Campus store");

    // Only provisioning may bring a new tenant database into existence.
    let driver = SqliteDriverConfig {
        create_missing: cli.command.creates_tenant(),
        ..cli.config.driver_config()
    };
    let factory = SqlitePoolFactory::new(cli.config.database_config())?.with_driver(driver);
    let registry = Arc::new(TenantRegistry::new(factory));

    let result = execute(cli.command, Arc::clone(&registry)).await;
    registry.shutdown();

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            if let Some(storage) = e.downcast_ref::<StorageError>() {
                let kind = storage.kind();
                error!(kind = %kind, status = kind.status_code(), "Command failed");
            }
            Err(e)
        }
    }
}
