//! Business logic shared by the HTTP handlers and the CLI.
//!
//! - [`event_sync`] - Incremental copy of remote events into the store
//! - [`event_query`] - Paginated reads of stored events
//! - [`explorer`] - Live, filterable reads straight from Shopify

pub mod event_query;
pub mod event_sync;
pub mod explorer;

use std::sync::Arc;

use shoplog_core::ShopDomain;

use crate::db::EventStore;
use crate::shopify::EventSource;

/// Everything a request needs to act on behalf of one shop.
///
/// Passed explicitly into every service call; nothing here is global.
#[derive(Clone)]
pub struct ShopContext {
    pub shop: ShopDomain,
    pub store: Arc<dyn EventStore>,
    pub source: Arc<dyn EventSource>,
}

impl ShopContext {
    /// Bundle a shop with its store and remote source.
    #[must_use]
    pub fn new(shop: ShopDomain, store: Arc<dyn EventStore>, source: Arc<dyn EventSource>) -> Self {
        Self {
            shop,
            store,
            source,
        }
    }
}

impl std::fmt::Debug for ShopContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopContext")
            .field("shop", &self.shop)
            .finish_non_exhaustive()
    }
}
