//! Shared fixtures for Shoplog integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shoplog-integration-tests
//! ```
//!
//! Most tests run in process: the in-memory event store stands in for
//! `PostgreSQL`, and Shopify is either a [`ScriptedSource`] or a local axum
//! server started with [`serve`].
//!
//! The `postgres_store` tests are `#[ignore]`d and need a live database:
//!
//! ```bash
//! SHOPLOG_TEST_DATABASE_URL=postgres://localhost/shoplog_test \
//!     cargo test -p shoplog-integration-tests -- --ignored
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;

use shoplog_admin::config::ShopifyConfig;
use shoplog_admin::db::MemoryEventStore;
use shoplog_admin::services::ShopContext;
use shoplog_admin::shopify::{
    EventPage, EventQuery, EventSource, PageCursor, PageInfo, RemoteEvent, ShopifyError,
};
use shoplog_admin::state::AppState;
use shoplog_core::{EventId, ShopDomain, SubjectId};

/// Domain used by every fixture.
pub const SHOP: &str = "acme.myshopify.com";

/// Event source that replays a fixed script and records every query.
///
/// Once the script is exhausted it answers with empty pages.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<EventPage, ShopifyError>>>,
    queries: Mutex<Vec<EventQuery>>,
}

impl ScriptedSource {
    /// A source that serves `pages` in order.
    #[must_use]
    pub fn new(pages: Vec<EventPage>) -> Self {
        Self::with_results(pages.into_iter().map(Ok).collect())
    }

    /// A source that serves `results` in order, errors included.
    #[must_use]
    pub fn with_results(results: Vec<Result<EventPage, ShopifyError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queue more results behind the current script.
    pub fn push(&self, page: EventPage) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(page));
    }

    /// Every query received so far.
    #[must_use]
    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, ShopifyError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(EventPage::default()))
    }
}

/// The fixture shop.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).unwrap_or_else(|e| panic!("fixture shop is invalid: {e}"))
}

/// `minutes` after 2024-03-01T00:00:00Z.
#[must_use]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
        + Duration::minutes(minutes)
}

/// A remote event with remote id `id`, created `id` minutes into the fixture day.
#[must_use]
pub fn remote_event(id: i64) -> RemoteEvent {
    RemoteEvent {
        id: Some(EventId::new(id)),
        subject_id: Some(SubjectId::new(1000 + id)),
        created_at: at(id),
        subject_type: Some("Product".to_string()),
        verb: Some("create".to_string()),
        arguments: serde_json::json!([format!("Product {id}")]),
        body: None,
        message: Some(format!("Product {id} was created")),
        author: Some("Shopify".to_string()),
        description: Some(format!("Product {id} was created.")),
        path: Some(format!("/admin/products/{}", 1000 + id)),
    }
}

/// A cursor as Shopify would put it in a `Link` header.
#[must_use]
pub fn cursor(token: &str, limit: u32) -> PageCursor {
    PageCursor::new(BTreeMap::from([
        ("limit".to_string(), limit.to_string()),
        ("page_info".to_string(), token.to_string()),
    ]))
}

/// A page of `ids`, optionally pointing at a next page.
#[must_use]
pub fn page(ids: &[i64], next: Option<PageCursor>) -> EventPage {
    EventPage {
        events: ids.iter().copied().map(remote_event).collect(),
        page_info: PageInfo {
            next,
            previous: None,
        },
    }
}

/// A service context over the given store and source.
#[must_use]
pub fn context(store: Arc<MemoryEventStore>, source: Arc<ScriptedSource>) -> ShopContext {
    ShopContext::new(shop(), store, source)
}

/// Application state over the given store and source.
#[must_use]
pub fn app_state(store: Arc<MemoryEventStore>, source: Arc<ScriptedSource>) -> AppState {
    AppState::new(shop(), None, store, source)
}

/// Shopify settings for the fixture shop.
#[must_use]
pub fn shopify_config() -> ShopifyConfig {
    ShopifyConfig {
        store: shop(),
        api_version: "2024-10".to_string(),
        access_token: SecretString::from("shpat_test_7f3a9c2e1b8d4f6a"),
    }
}

/// Serve `router` on an ephemeral local port.
///
/// # Errors
///
/// Returns the bind error if no port is available.
pub async fn serve(router: Router) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            panic!("fixture server failed: {e}");
        }
    });
    Ok(addr)
}
