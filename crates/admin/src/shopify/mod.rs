//! Shopify Admin REST API access for the events resource.
//!
//! # Architecture
//!
//! - [`AdminClient`] talks to `GET /admin/api/{version}/events.json` with the
//!   store's access token.
//! - [`EventSource`] is the seam the sync engine and the live explorer depend
//!   on, so both can run against a scripted source in tests.
//! - Pagination cursors arrive in the `Link` response header and are carried
//!   around as opaque [`PageCursor`] values.
//!
//! # Example
//!
//! ```rust,ignore
//! use shoplog_admin::shopify::{AdminClient, EventQuery, EventSource};
//!
//! let client = AdminClient::new(&config.shopify)?;
//! let page = client.fetch_events(&EventQuery::since(watermark, 250)).await?;
//! if let Some(next) = page.page_info.next {
//!     let more = client.fetch_events(&EventQuery::at_cursor(next, 250)).await?;
//! }
//! ```

mod client;
mod link;
pub mod types;

pub use client::AdminClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body or URL could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A pagination cursor supplied by a caller was not valid JSON.
    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),
}

/// A paginated source of remote events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch one page of events matching `query`.
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, ShopifyError>;
}
