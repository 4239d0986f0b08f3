//! Manual event sync command.
//!
//! Runs the same watermark sync the event list page runs on every load, for
//! the shop named by `SHOPIFY_STORE`.
//!
//! # Usage
//!
//! ```bash
//! shoplog-cli sync
//! ```
//!
//! Reads the same environment as the admin server (see
//! `shoplog_admin::config`).

use std::sync::Arc;

use shoplog_admin::config::{AdminConfig, ConfigError, StoreBackend};
use shoplog_admin::db::{self, EventStore, MemoryEventStore, PgEventStore};
use shoplog_admin::services::ShopContext;
use shoplog_admin::services::event_sync::{SyncError, SyncReport, sync_shop_events};
use shoplog_admin::shopify::{AdminClient, ShopifyError};
use thiserror::Error;

/// Errors that can occur during a manual sync.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// The Shopify client could not be built.
    #[error("Shopify client error: {0}")]
    Client(#[from] ShopifyError),

    /// The sync itself failed.
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
}

/// Run one sync and log what it did.
///
/// # Errors
///
/// Returns `SyncCommandError` if configuration, the database, or Shopify
/// fails.
pub async fn run() -> Result<SyncReport, SyncCommandError> {
    let config = AdminConfig::from_env()?;

    let store: Arc<dyn EventStore> = match (config.store_backend, &config.database_url) {
        (StoreBackend::Postgres, Some(database_url)) => {
            tracing::info!("Connecting to database...");
            Arc::new(PgEventStore::new(db::create_pool(database_url).await?))
        }
        (StoreBackend::Postgres, None) => {
            return Err(ConfigError::MissingEnvVar("SHOPLOG_DATABASE_URL".to_string()).into());
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("Syncing into the in-memory store; nothing will be kept");
            Arc::new(MemoryEventStore::new())
        }
    };

    let source = AdminClient::new(&config.shopify)?;
    let ctx = ShopContext::new(config.shopify.store.clone(), store, Arc::new(source));

    tracing::info!(shop = %ctx.shop, "Syncing events...");
    let report = sync_shop_events(&ctx, config.shop_email.as_ref()).await?;

    tracing::info!(
        pages = report.pages,
        inserted = report.inserted,
        skipped = report.skipped,
        "Sync complete!"
    );
    Ok(report)
}
