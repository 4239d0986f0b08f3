//! Incremental event sync.
//!
//! The watermark is the `created_at` of the newest stored event for the shop
//! (the Unix epoch when there is none). Every page at or after the watermark
//! is fetched, following `Link` cursors, and each event is inserted unless its
//! remote id is already stored. Re-running a sync is therefore safe.
//!
//! A shop's first sync also flips its `initial_migration` flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use shoplog_core::{Email, ShopDomain};

use super::ShopContext;
use crate::db::RepositoryError;
use crate::models::{NewEvent, ShopUser};
use crate::shopify::{EventQuery, RemoteEvent, ShopifyError};

/// Events requested per page while syncing (Shopify's maximum).
pub const SYNC_PAGE_SIZE: u32 = 250;

/// Errors that abort a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing the local store failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    /// Fetching a page from Shopify failed.
    #[error("remote error: {0}")]
    Remote(#[from] ShopifyError),
}

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote pages requested.
    pub pages: u32,
    /// Events returned across all pages.
    pub seen: u64,
    /// Events newly written to the store.
    pub inserted: u64,
    /// Events already present (by remote id).
    pub skipped: u64,
    /// Lower `created_at` bound used for the first request.
    pub watermark: DateTime<Utc>,
    /// Whether this run was the shop's first (initial migration).
    pub initial_migration: bool,
}

impl SyncReport {
    const fn new(watermark: DateTime<Utc>) -> Self {
        Self {
            pages: 0,
            seen: 0,
            inserted: 0,
            skipped: 0,
            watermark,
            initial_migration: false,
        }
    }
}

/// Load the shop's user, creating it on first sight.
///
/// # Errors
///
/// Returns `RepositoryError` if the store cannot be read or written.
#[instrument(skip(ctx, email), fields(shop = %ctx.shop))]
pub async fn ensure_user(
    ctx: &ShopContext,
    email: Option<&Email>,
) -> Result<ShopUser, RepositoryError> {
    if let Some(user) = ctx.store.find_user(&ctx.shop).await? {
        return Ok(user);
    }

    let user = ctx.store.create_user(&ctx.shop, email).await?;
    info!("Created user for new shop");
    Ok(user)
}

/// Bring the shop's stored events up to date with Shopify.
///
/// Creates the shop's user if needed, runs the watermark sync, and marks the
/// initial migration done after a shop's first successful sync.
///
/// # Errors
///
/// Returns `SyncError::Remote` if any page request fails (nothing is retried)
/// and `SyncError::Store` on storage failures. Events stored before the
/// failure stay stored.
#[instrument(skip(ctx, email), fields(shop = %ctx.shop))]
pub async fn sync_shop_events(
    ctx: &ShopContext,
    email: Option<&Email>,
) -> Result<SyncReport, SyncError> {
    let user = ensure_user(ctx, email).await?;

    // Both branches run the same watermark sync; only the first flips the flag.
    let report = if user.initial_migration {
        fetch_and_store_events(ctx).await?
    } else {
        let mut report = fetch_and_store_events(ctx).await?;
        ctx.store.mark_initial_migration(&ctx.shop).await?;
        report.initial_migration = true;
        report
    };

    info!(
        pages = report.pages,
        seen = report.seen,
        inserted = report.inserted,
        skipped = report.skipped,
        watermark = %report.watermark,
        initial_migration = report.initial_migration,
        "Event sync complete"
    );
    Ok(report)
}

async fn fetch_and_store_events(ctx: &ShopContext) -> Result<SyncReport, SyncError> {
    let watermark = ctx
        .store
        .latest_event_created_at(&ctx.shop)
        .await?
        .unwrap_or(DateTime::UNIX_EPOCH);

    let mut report = SyncReport::new(watermark);
    let mut query = EventQuery::since(watermark, SYNC_PAGE_SIZE);

    loop {
        let page = ctx.source.fetch_events(&query).await?;
        report.pages += 1;

        for remote in &page.events {
            report.seen += 1;
            let event = new_event_from_remote(&ctx.shop, remote);

            if ctx.store.event_exists(event.event_id).await? {
                report.skipped += 1;
                continue;
            }
            if ctx.store.insert_event(&event).await? {
                report.inserted += 1;
            } else {
                report.skipped += 1;
            }
        }

        match page.page_info.next {
            Some(cursor) => query.cursor = Some(cursor),
            None => break,
        }
    }

    Ok(report)
}

/// Map a remote event onto a store row for `shop`.
///
/// Missing text fields become empty strings, missing ids become zero, and a
/// missing `arguments` value is stored as the JSON text `null`.
#[must_use]
pub fn new_event_from_remote(shop: &ShopDomain, remote: &RemoteEvent) -> NewEvent {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    NewEvent {
        event_id: remote.id.unwrap_or_default(),
        shop: shop.clone(),
        created_at: remote.created_at,
        verb: text(&remote.verb),
        subject_type: text(&remote.subject_type),
        subject_id: remote.subject_id.unwrap_or_default(),
        path: text(&remote.path),
        message: text(&remote.message),
        description: text(&remote.description),
        author: text(&remote.author),
        arguments: serde_json::to_string(&remote.arguments)
            .unwrap_or_else(|_| "null".to_string()),
        body: text(&remote.body),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use shoplog_core::{EventId, PageRequest, SubjectId};

    use super::*;
    use crate::db::{EventStore, MemoryEventStore};
    use crate::shopify::{EventPage, EventSource, PageCursor, PageInfo};

    /// Replays canned pages and records every query it receives.
    #[derive(Default)]
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<EventPage, ShopifyError>>>,
        queries: Mutex<Vec<EventQuery>>,
    }

    impl ScriptedSource {
        fn push(&self, page: Result<EventPage, ShopifyError>) {
            self.pages.lock().unwrap().push_back(page);
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, ShopifyError> {
            self.queries.lock().unwrap().push(query.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(EventPage::default()))
        }
    }

    fn remote(id: i64, hour: u32) -> RemoteEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "subject_id": 10,
            "created_at": Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            "subject_type": "Order",
            "verb": "placed",
            "description": format!("Order {id} placed"),
        }))
        .unwrap()
    }

    fn next_cursor(token: &str) -> PageInfo {
        PageInfo {
            next: Some(PageCursor::new(
                [("page_info".to_string(), token.to_string())].into(),
            )),
            previous: None,
        }
    }

    fn context(source: Arc<ScriptedSource>) -> (ShopContext, Arc<MemoryEventStore>) {
        let store = Arc::new(MemoryEventStore::new());
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        (ShopContext::new(shop, store.clone(), source), store)
    }

    #[test]
    fn test_missing_remote_fields_default() {
        let remote: RemoteEvent =
            serde_json::from_str(r#"{"created_at":"2024-03-01T00:00:00Z"}"#).unwrap();
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        let event = new_event_from_remote(&shop, &remote);

        assert_eq!(event.event_id, EventId::new(0));
        assert_eq!(event.subject_id, SubjectId::new(0));
        assert_eq!(event.verb, "");
        assert_eq!(event.body, "");
        assert_eq!(event.arguments, "null");
    }

    #[test]
    fn test_arguments_serialized_as_json() {
        let mut remote = remote(1, 0);
        remote.arguments = serde_json::json!(["IPod Nano - 8GB", 2]);
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        let event = new_event_from_remote(&shop, &remote);
        assert_eq!(event.arguments, r#"["IPod Nano - 8GB",2]"#);
    }

    #[tokio::test]
    async fn test_first_sync_uses_epoch_and_sets_flag() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(EventPage {
            events: vec![remote(1, 1), remote(2, 2)],
            page_info: PageInfo::default(),
        }));
        let (ctx, store) = context(source.clone());

        let report = sync_shop_events(&ctx, None).await.unwrap();

        assert_eq!(report.watermark, DateTime::UNIX_EPOCH);
        assert_eq!(report.inserted, 2);
        assert!(report.initial_migration);
        assert!(store.find_user(&ctx.shop).await.unwrap().unwrap().initial_migration);

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].limit, SYNC_PAGE_SIZE);
        assert_eq!(queries[0].created_at_min, Some(DateTime::UNIX_EPOCH));
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(EventPage {
            events: vec![remote(1, 1)],
            page_info: next_cursor("p2"),
        }));
        source.push(Ok(EventPage {
            events: vec![remote(2, 2)],
            page_info: next_cursor("p3"),
        }));
        source.push(Ok(EventPage {
            events: vec![remote(3, 3)],
            page_info: PageInfo::default(),
        }));
        let (ctx, store) = context(source.clone());

        let report = sync_shop_events(&ctx, None).await.unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(store.count_events(&ctx.shop).await.unwrap(), 3);

        let queries = source.queries.lock().unwrap();
        assert_eq!(
            queries[2].cursor.as_ref().unwrap().get("page_info"),
            Some("p3")
        );
    }

    #[tokio::test]
    async fn test_second_sync_starts_at_watermark_and_skips_duplicates() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(EventPage {
            events: vec![remote(1, 1), remote(2, 5)],
            page_info: PageInfo::default(),
        }));
        // Shopify's created_at_min is inclusive, so the newest event comes back.
        source.push(Ok(EventPage {
            events: vec![remote(2, 5), remote(3, 6)],
            page_info: PageInfo::default(),
        }));
        let (ctx, store) = context(source.clone());

        sync_shop_events(&ctx, None).await.unwrap();
        let second = sync_shop_events(&ctx, None).await.unwrap();

        assert_eq!(
            second.watermark,
            Utc.with_ymd_and_hms(2024, 3, 1, 5, 0, 0).unwrap()
        );
        assert_eq!(second.inserted, 1);
        assert_eq!(second.skipped, 1);
        assert!(!second.initial_migration);
        assert_eq!(store.len().await, 3);

        let listed = store
            .list_events(&ctx.shop, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listed.first().unwrap().event_id, EventId::new(3));
    }

    #[tokio::test]
    async fn test_remote_failure_aborts_without_flag() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(EventPage {
            events: vec![remote(1, 1)],
            page_info: next_cursor("p2"),
        }));
        source.push(Err(ShopifyError::RateLimited(2)));
        let (ctx, store) = context(source);

        let result = sync_shop_events(&ctx, None).await;
        assert!(matches!(
            result,
            Err(SyncError::Remote(ShopifyError::RateLimited(2)))
        ));
        // Progress before the failure is kept; the flag is not set.
        assert_eq!(store.len().await, 1);
        assert!(!store.find_user(&ctx.shop).await.unwrap().unwrap().initial_migration);
    }

    #[tokio::test]
    async fn test_ensure_user_records_email_once() {
        let source = Arc::new(ScriptedSource::default());
        let (ctx, _store) = context(source);
        let email = Email::parse("owner@acme.test").unwrap();

        let created = ensure_user(&ctx, Some(&email)).await.unwrap();
        assert_eq!(created.email, Some(email));

        let again = ensure_user(&ctx, None).await.unwrap();
        assert_eq!(again, created);
    }
}
