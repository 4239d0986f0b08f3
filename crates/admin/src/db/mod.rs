//! Persistence for shop users and events.
//!
//! ## Tables
//!
//! - `shop_user` - One row per shop, with the initial-migration flag
//! - `event` - Events copied from Shopify, unique by remote `event_id`
//!
//! Handlers and services see storage only through [`EventStore`]. The
//! `PostgreSQL` implementation is [`PgEventStore`]; [`MemoryEventStore`]
//! backs tests and `SHOPLOG_STORE_BACKEND=memory`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p shoplog-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shoplog_core::{Email, EventId, EventRecordId, PageRequest, ShopDomain};

use crate::models::{NewEvent, ShopUser, StoredEvent};

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage operations needed by the sync engine and the views.
///
/// Every read is scoped to one shop. `event_id` is unique across the whole
/// store, so [`insert_event`](Self::insert_event) reports a duplicate by
/// returning `false` rather than failing.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Look up a shop's user record.
    async fn find_user(&self, shop: &ShopDomain) -> Result<Option<ShopUser>, RepositoryError>;

    /// Create the user record for a shop, or return the existing one.
    async fn create_user(
        &self,
        shop: &ShopDomain,
        email: Option<&Email>,
    ) -> Result<ShopUser, RepositoryError>;

    /// Record that the first full backfill for `shop` has finished.
    async fn mark_initial_migration(&self, shop: &ShopDomain) -> Result<(), RepositoryError>;

    /// `created_at` of the newest stored event for `shop`.
    async fn latest_event_created_at(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// Whether an event with this remote id is already stored.
    async fn event_exists(&self, event_id: EventId) -> Result<bool, RepositoryError>;

    /// Insert an event; `false` means its `event_id` was already present.
    async fn insert_event(&self, event: &NewEvent) -> Result<bool, RepositoryError>;

    /// One page of a shop's events, newest first.
    async fn list_events(
        &self,
        shop: &ShopDomain,
        request: PageRequest,
    ) -> Result<Vec<StoredEvent>, RepositoryError>;

    /// Number of events stored for `shop`.
    async fn count_events(&self, shop: &ShopDomain) -> Result<u64, RepositoryError>;

    /// An event by local key.
    async fn get_event(
        &self,
        shop: &ShopDomain,
        id: EventRecordId,
    ) -> Result<Option<StoredEvent>, RepositoryError>;

    /// An event by remote id.
    async fn find_by_event_id(
        &self,
        shop: &ShopDomain,
        event_id: EventId,
    ) -> Result<Option<StoredEvent>, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
