use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use okinawanow_backend::config::AppConfig;
use okinawanow_backend::favorites::FAVORITES;
use okinawanow_backend::models::{Actor, Role};
use okinawanow_backend::store::{DocumentStore, MongoStore};
use okinawanow_backend::sync::{SyncService, LISTINGS, PROPERTIES};
use okinawanow_backend::tours::TOUR_REQUESTS;

/// Maintenance tasks for the OkinawaNow listing data.
#[derive(Parser)]
#[command(name = "okinawanow-backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every property with its listing, then remove orphans
    Sync {
        /// Agency id to attribute newly created listings to
        #[arg(long)]
        agency: String,
    },
    /// Delete listings whose property no longer exists
    Cleanup,
    /// Print document counts for the main collections
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let store: Arc<dyn DocumentStore> =
        Arc::new(MongoStore::connect(&config.mongodb_uri, &config.database_name).await?);

    match cli.command {
        Command::Sync { agency } => {
            let service = SyncService::new(store);
            let actor = Actor::new(agency, Role::Agency);
            let report = service.sync_all(&actor).await?;
            info!(
                created = report.created,
                updated = report.updated,
                orphans_removed = report.orphans_removed,
                "sync finished"
            );
        }
        Command::Cleanup => {
            let service = SyncService::new(store);
            let removed = service.cleanup_orphaned_listings().await?;
            info!(removed, "orphan cleanup finished");
        }
        Command::Check => {
            for collection in [PROPERTIES, LISTINGS, TOUR_REQUESTS, FAVORITES] {
                let count = store.query(collection, &[]).await?.len();
                println!("{collection}: {count} documents");
            }
        }
    }

    Ok(())
}
