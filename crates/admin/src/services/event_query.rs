//! Paginated reads of a shop's stored events.

use tracing::{instrument, warn};

use shoplog_core::{EventId, EventRecordId, Page, PageRequest};

use super::ShopContext;
use crate::db::RepositoryError;
use crate::models::StoredEvent;

/// One page of the shop's events, newest first, with totals.
///
/// A page past the end yields an empty item list, not an error.
///
/// # Errors
///
/// Returns `RepositoryError` if the store cannot be read.
#[instrument(
    skip(ctx, request),
    fields(shop = %ctx.shop, page = request.page(), page_size = request.page_size())
)]
pub async fn list_events(
    ctx: &ShopContext,
    request: PageRequest,
) -> Result<Page<StoredEvent>, RepositoryError> {
    let items = ctx.store.list_events(&ctx.shop, request).await?;
    let total = ctx.store.count_events(&ctx.shop).await?;
    Ok(Page::new(items, total, request))
}

/// An event by local key, if it belongs to the shop.
///
/// # Errors
///
/// Returns `RepositoryError` if the store cannot be read.
pub async fn event_detail(
    ctx: &ShopContext,
    id: EventRecordId,
) -> Result<Option<StoredEvent>, RepositoryError> {
    let event = ctx.store.get_event(&ctx.shop, id).await?;
    if event.is_none() {
        warn!(shop = %ctx.shop, id = %id, "Event not found");
    }
    Ok(event)
}

/// An event by remote id, if it has been synced for the shop.
///
/// # Errors
///
/// Returns `RepositoryError` if the store cannot be read.
pub async fn event_detail_by_remote_id(
    ctx: &ShopContext,
    event_id: EventId,
) -> Result<Option<StoredEvent>, RepositoryError> {
    let event = ctx.store.find_by_event_id(&ctx.shop, event_id).await?;
    if event.is_none() {
        warn!(shop = %ctx.shop, event_id = %event_id, "Remote event not synced");
    }
    Ok(event)
}
