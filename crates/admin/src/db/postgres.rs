//! `PostgreSQL` implementation of [`EventStore`].
//!
//! Queries are built at runtime so the crate compiles without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use shoplog_core::{Email, EventId, EventRecordId, PageRequest, ShopDomain, SubjectId};

use super::{EventStore, RepositoryError};
use crate::models::{NewEvent, ShopUser, StoredEvent};

const EVENT_COLUMNS: &str = "id, event_id, shop, created_at, verb, subject_type, subject_id, \
                             path, message, description, author, arguments, body";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ShopUserRow {
    shop: ShopDomain,
    email: Option<String>,
    initial_migration: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShopUserRow> for ShopUser {
    type Error = RepositoryError;

    fn try_from(row: ShopUserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            shop: row.shop,
            email,
            initial_migration: row.initial_migration,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: EventRecordId,
    event_id: EventId,
    shop: ShopDomain,
    created_at: DateTime<Utc>,
    verb: String,
    subject_type: String,
    subject_id: SubjectId,
    path: String,
    message: String,
    description: String,
    author: String,
    arguments: String,
    body: String,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            shop: row.shop,
            created_at: row.created_at,
            verb: row.verb,
            subject_type: row.subject_type,
            subject_id: row.subject_id,
            path: row.path,
            message: row.message,
            description: row.description,
            author: row.author,
            arguments: row.arguments,
            body: row.body,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Event store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self, shop), fields(shop = %shop))]
    async fn find_user(&self, shop: &ShopDomain) -> Result<Option<ShopUser>, RepositoryError> {
        let row: Option<ShopUserRow> = sqlx::query_as(
            r"
            SELECT shop, email, initial_migration, created_at
            FROM shop_user
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, shop, email), fields(shop = %shop))]
    async fn create_user(
        &self,
        shop: &ShopDomain,
        email: Option<&Email>,
    ) -> Result<ShopUser, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop_user (shop, email)
            VALUES ($1, $2)
            ON CONFLICT (shop) DO NOTHING
            ",
        )
        .bind(shop)
        .bind(email.map(Email::as_str))
        .execute(&self.pool)
        .await?;

        self.find_user(shop).await?.ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, shop), fields(shop = %shop))]
    async fn mark_initial_migration(&self, shop: &ShopDomain) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop_user SET initial_migration = TRUE WHERE shop = $1")
            .bind(shop)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn latest_event_created_at(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM event WHERE shop = $1")
                .bind(shop)
                .fetch_one(&self.pool)
                .await?;
        Ok(latest)
    }

    async fn event_exists(&self, event_id: EventId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM event WHERE event_id = $1)")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, event), fields(event_id = %event.event_id, shop = %event.shop))]
    async fn insert_event(&self, event: &NewEvent) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO event
                (event_id, shop, created_at, verb, subject_type, subject_id,
                 path, message, description, author, arguments, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (event_id) DO NOTHING
            ",
        )
        .bind(event.event_id)
        .bind(&event.shop)
        .bind(event.created_at)
        .bind(&event.verb)
        .bind(&event.subject_type)
        .bind(event.subject_id)
        .bind(&event.path)
        .bind(&event.message)
        .bind(&event.description)
        .bind(&event.author)
        .bind(&event.arguments)
        .bind(&event.body)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!("Event already stored");
        }
        Ok(inserted)
    }

    #[instrument(
        skip(self, shop, request),
        fields(shop = %shop, page = request.page(), page_size = request.page_size())
    )]
    async fn list_events(
        &self,
        shop: &ShopDomain,
        request: PageRequest,
    ) -> Result<Vec<StoredEvent>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM event WHERE shop = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(shop)
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    async fn count_events(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event WHERE shop = $1")
            .bind(shop)
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative event count {count}")))
    }

    async fn get_event(
        &self,
        shop: &ShopDomain,
        id: EventRecordId,
    ) -> Result<Option<StoredEvent>, RepositoryError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM event WHERE shop = $1 AND id = $2");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(shop)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StoredEvent::from))
    }

    async fn find_by_event_id(
        &self,
        shop: &ShopDomain,
        event_id: EventId,
    ) -> Result<Option<StoredEvent>, RepositoryError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM event WHERE shop = $1 AND event_id = $2");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(shop)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StoredEvent::from))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
