//! Shopify Admin REST client for the events resource.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use shoplog_core::ShopDomain;

use super::types::{EventPage, EventQuery, EventsEnvelope, PageInfo};
use super::{EventSource, ShopifyError};
use crate::config::ShopifyConfig;

const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Shopify Admin REST API client bound to one store.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: ShopDomain,
    /// `https://{store}/admin/api/{version}/`
    base_url: Url,
}

impl AdminClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let base = format!(
            "https://{}/admin/api/{}/",
            config.store.as_str(),
            config.api_version
        );
        let base_url =
            Url::parse(&base).map_err(|e| ShopifyError::Parse(format!("invalid store URL: {e}")))?;
        Self::with_base_url(config, base_url)
    }

    /// Create a client that sends requests to `base_url` instead of the store.
    ///
    /// `base_url` is the API root that `events.json` is resolved against.
    ///
    /// # Errors
    ///
    /// Same as [`AdminClient::new`].
    pub fn with_base_url(config: &ShopifyConfig, mut base_url: Url) -> Result<Self, ShopifyError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut token = HeaderValue::from_str(config.access_token.expose_secret())
            .map_err(|e| ShopifyError::Parse(format!("Invalid access token format: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                store: config.store.clone(),
                base_url,
            }),
        })
    }

    /// The store this client talks to.
    #[must_use]
    pub fn store(&self) -> &ShopDomain {
        &self.inner.store
    }

    /// Fetch one page of events.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, Shopify answers with a non-2xx
    /// status, or the body is not an events envelope.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn list_events(&self, query: &EventQuery) -> Result<EventPage, ShopifyError> {
        let mut url = self
            .inner
            .base_url
            .join("events.json")
            .map_err(|e| ShopifyError::Parse(format!("invalid events URL: {e}")))?;
        url.query_pairs_mut().extend_pairs(query.to_params());

        let response = self.inner.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let page_info = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(PageInfo::from_link_header)
            .unwrap_or_default();

        let envelope: EventsEnvelope = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            count = envelope.events.len(),
            has_next = page_info.next.is_some(),
            "Fetched events page"
        );

        Ok(EventPage {
            events: envelope.events,
            page_info,
        })
    }

    /// Parse error response from the Admin API.
    async fn parse_error(&self, response: reqwest::Response) -> ShopifyError {
        let status = response.status().as_u16();

        if status == 429 {
            // Shopify sends fractional seconds ("2.0")
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil().max(0.0) as u64);
            return ShopifyError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return ShopifyError::Unauthorized(format!(
                "access token rejected for {}",
                self.inner.store
            ));
        }

        if status == 404 {
            return ShopifyError::NotFound("events resource".to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        ShopifyError::Api { status, message }
    }
}

#[async_trait]
impl EventSource for AdminClient {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, ShopifyError> {
        self.list_events(query).await
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("store", &self.inner.store)
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
