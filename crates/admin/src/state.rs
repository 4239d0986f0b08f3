//! Application state shared across handlers.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use shoplog_core::{Email, ShopDomain};

use crate::db::EventStore;
use crate::error::set_sentry_shop;
use crate::services::ShopContext;
use crate::shopify::EventSource;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and remote source are trait
/// objects so the same router runs against `PostgreSQL` and Shopify in
/// production and against in-memory fakes in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    shop: ShopDomain,
    shop_email: Option<Email>,
    store: Arc<dyn EventStore>,
    source: Arc<dyn EventSource>,
}

impl AppState {
    /// Create a new application state for the configured shop.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        shop_email: Option<Email>,
        store: Arc<dyn EventStore>,
        source: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                shop,
                shop_email,
                store,
                source,
            }),
        }
    }

    /// The shop this instance serves.
    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    /// Email recorded when the shop's user is first created.
    #[must_use]
    pub fn shop_email(&self) -> Option<&Email> {
        self.inner.shop_email.as_ref()
    }

    /// The event store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.inner.store
    }

    /// A per-request context for the service layer.
    #[must_use]
    pub fn shop_context(&self) -> ShopContext {
        ShopContext::new(
            self.inner.shop.clone(),
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.source),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("shop", &self.inner.shop)
            .finish_non_exhaustive()
    }
}

/// Extractor for the shop a request acts on.
///
/// Tags the Sentry scope with the shop before the handler runs.
///
/// ```rust,ignore
/// async fn handler(CurrentShop(ctx): CurrentShop) -> impl IntoResponse {
///     ctx.shop.to_string()
/// }
/// ```
pub struct CurrentShop(pub ShopContext);

impl FromRequestParts<AppState> for CurrentShop {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = state.shop_context();
        set_sentry_shop(&ctx.shop);
        Ok(Self(ctx))
    }
}
