//! Stored event list and detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use shoplog_core::{EventId, EventRecordId, PageRequest};

use crate::{
    error::AppError,
    filters,
    models::StoredEvent,
    services::{event_query, event_sync},
    state::{AppState, CurrentShop},
};

/// Timestamp format used on event pages.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Pagination query parameters.
///
/// Kept as raw text so malformed values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// Event row for the list template.
#[derive(Debug, Clone)]
pub struct EventRowView {
    pub id: String,
    pub event_id: String,
    pub created_at: String,
    pub verb: String,
    pub subject_type: String,
    pub subject_id: String,
    pub message: String,
    pub author: String,
}

impl From<&StoredEvent> for EventRowView {
    fn from(event: &StoredEvent) -> Self {
        Self {
            id: event.id.to_string(),
            event_id: event.event_id.to_string(),
            created_at: event.created_at.format(TIMESTAMP_FORMAT).to_string(),
            verb: event.verb.clone(),
            subject_type: event.subject_type.clone(),
            subject_id: event.subject_id.to_string(),
            message: event.message.clone(),
            author: event.author.clone(),
        }
    }
}

/// Every stored field, as text. Blank when the event was not found.
#[derive(Debug, Clone, Default)]
pub struct EventDetailView {
    pub found: bool,
    pub id: String,
    pub event_id: String,
    pub created_at: String,
    pub verb: String,
    pub subject_type: String,
    pub subject_id: String,
    pub path: String,
    pub message: String,
    pub description: String,
    pub author: String,
    pub arguments: String,
    pub body: String,
}

impl From<&StoredEvent> for EventDetailView {
    fn from(event: &StoredEvent) -> Self {
        Self {
            found: true,
            id: event.id.to_string(),
            event_id: event.event_id.to_string(),
            created_at: event.created_at.format(TIMESTAMP_FORMAT).to_string(),
            verb: event.verb.clone(),
            subject_type: event.subject_type.clone(),
            subject_id: event.subject_id.to_string(),
            path: event.path.clone(),
            message: event.message.clone(),
            description: event.description.clone(),
            author: event.author.clone(),
            arguments: pretty_json(&event.arguments),
            body: event.body.clone(),
        }
    }
}

/// Pretty-print stored JSON text, falling back to the raw text.
fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| raw.to_string())
}

/// Event list page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/index.html")]
pub struct EventsIndexTemplate {
    pub shop: String,
    pub current_path: String,
    pub events: Vec<EventRowView>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
    pub inserted: u64,
}

/// Event detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/detail.html")]
pub struct EventDetailTemplate {
    pub shop: String,
    pub current_path: String,
    pub event: EventDetailView,
}

/// Event list handler: syncs with Shopify, then renders one stored page.
///
/// # Errors
///
/// Returns `AppError::Shopify` (502) when the sync cannot reach Shopify and
/// `AppError::Database` (500) when the store fails.
#[instrument(skip(state, ctx, query), fields(shop = %ctx.shop))]
pub async fn index(
    State(state): State<AppState>,
    CurrentShop(ctx): CurrentShop,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = event_sync::sync_shop_events(&ctx, state.shop_email()).await?;

    let request = PageRequest::from_params(query.page.as_deref(), query.page_size.as_deref());
    let page = event_query::list_events(&ctx, request).await?;

    let total_pages = page.total_pages();
    let previous_page = page.has_previous().then(|| page.page() - 1);
    let next_page = page.has_next().then(|| page.page().saturating_add(1));

    Ok(EventsIndexTemplate {
        shop: ctx.shop.to_string(),
        current_path: "/app".to_string(),
        events: page.items.iter().map(EventRowView::from).collect(),
        page: page.page(),
        page_size: request.page_size(),
        total: page.total,
        total_pages,
        previous_page,
        next_page,
        inserted: report.inserted,
    })
}

/// Event detail by local key.
///
/// An unknown key renders the page with every field blank.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a non-numeric key and
/// `AppError::Database` when the store fails.
#[instrument(skip(ctx), fields(shop = %ctx.shop))]
pub async fn show(
    CurrentShop(ctx): CurrentShop,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = id
        .parse::<i32>()
        .map(EventRecordId::new)
        .map_err(|_| AppError::BadRequest(format!("invalid event id '{id}'")))?;

    let event = event_query::event_detail(&ctx, id).await?;
    Ok(detail_page(&ctx.shop.to_string(), event.as_ref()))
}

/// Event detail by Shopify event id, linked from the live explorer.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a non-numeric id and
/// `AppError::Database` when the store fails.
#[instrument(skip(ctx), fields(shop = %ctx.shop))]
pub async fn show_remote(
    CurrentShop(ctx): CurrentShop,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = event_id
        .parse::<EventId>()
        .map_err(|_| AppError::BadRequest(format!("invalid event id '{event_id}'")))?;

    let event = event_query::event_detail_by_remote_id(&ctx, event_id).await?;
    Ok(detail_page(&ctx.shop.to_string(), event.as_ref()))
}

fn detail_page(shop: &str, event: Option<&StoredEvent>) -> EventDetailTemplate {
    EventDetailTemplate {
        shop: shop.to_string(),
        current_path: "/app".to_string(),
        event: event.map(EventDetailView::from).unwrap_or_default(),
    }
}
