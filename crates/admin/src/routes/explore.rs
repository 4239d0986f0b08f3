//! Live event explorer handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::Query, response::IntoResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use shoplog_core::date_range::format_ymd;
use shoplog_core::{DateRangePreset, DateRangeSelector};

use crate::{
    filters,
    services::explorer::{self, ExplorerRequest},
    shopify::{PageCursor, RemoteEvent},
    state::CurrentShop,
};

const EXPLORE_PATH: &str = "/app/explore";

/// Explorer query parameters, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct ExploreQuery {
    pub page: Option<String>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

/// A live event row.
#[derive(Debug, Clone)]
pub struct LiveEventView {
    pub event_id: String,
    pub created_at: String,
    pub verb: String,
    pub subject_type: String,
    pub subject_id: String,
    pub message: String,
    pub detail_href: Option<String>,
}

impl From<&RemoteEvent> for LiveEventView {
    fn from(event: &RemoteEvent) -> Self {
        Self {
            event_id: event.id.map(|id| id.to_string()).unwrap_or_default(),
            created_at: event.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            verb: event.verb.clone().unwrap_or_default(),
            subject_type: event.subject_type.clone().unwrap_or_default(),
            subject_id: event.subject_id.map(|id| id.to_string()).unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            detail_href: event.id.map(|id| format!("/app/remote-event/{id}")),
        }
    }
}

/// A quick-pick link next to the date inputs.
#[derive(Debug, Clone)]
pub struct PresetLink {
    pub title: String,
    pub href: String,
    pub active: bool,
}

/// Server-rendered state of the date-range picker.
#[derive(Debug, Clone)]
pub struct SelectorView {
    pub button_text: String,
    pub start_text: String,
    pub end_text: String,
    pub presets: Vec<PresetLink>,
}

impl SelectorView {
    /// Only the bounds present in `request` are shown; an open side stays blank.
    fn new(request: &ExplorerRequest, today: NaiveDate) -> Self {
        let range = request.range();
        let selector = range.map_or_else(
            || DateRangeSelector::new(today),
            |range| DateRangeSelector::with_committed(today, range),
        );

        let active = range.map(|_| selector.label().alias());
        let presets = DateRangePreset::ALL
            .into_iter()
            .map(|preset| {
                let preset_range = preset.range(today);
                PresetLink {
                    title: preset.title().to_string(),
                    href: explore_href(
                        None,
                        None,
                        Some(preset_range.start()),
                        Some(preset_range.end()),
                    ),
                    active: active == Some(preset.alias()),
                }
            })
            .collect();

        let (button_text, start_text, end_text) = match (request.start, request.end) {
            (Some(_), Some(_)) => (
                selector.button_text(),
                selector.start_text().to_string(),
                selector.end_text().to_string(),
            ),
            (Some(start), None) => (
                format!("From {}", format_ymd(start)),
                format_ymd(start),
                String::new(),
            ),
            (None, Some(end)) => (
                format!("Through {}", format_ymd(end)),
                String::new(),
                format_ymd(end),
            ),
            (None, None) => (
                "All dates".to_string(),
                selector.start_text().to_string(),
                selector.end_text().to_string(),
            ),
        };

        Self {
            button_text,
            start_text,
            end_text,
            presets,
        }
    }
}

/// Explorer page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/explore.html")]
pub struct ExploreTemplate {
    pub shop: String,
    pub current_path: String,
    pub page: u32,
    pub selector: SelectorView,
    /// `None` when the remote fetch failed.
    pub events: Option<Vec<LiveEventView>>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub clear_href: String,
}

/// Build an explorer URL. Filters ride along so the picker keeps showing them.
fn explore_href(
    page: Option<u32>,
    cursor: Option<&PageCursor>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> String {
    let mut params = Vec::new();
    if let Some(page) = page {
        params.push(format!("page={page}"));
    }
    if let Some(cursor) = cursor {
        params.push(format!("pageInfo={}", urlencoding::encode(&cursor.to_json())));
    }
    if let Some(start) = start {
        params.push(format!("startDate={}", format_ymd(start)));
    }
    if let Some(end) = end {
        params.push(format!("endDate={}", format_ymd(end)));
    }

    if params.is_empty() {
        EXPLORE_PATH.to_string()
    } else {
        format!("{EXPLORE_PATH}?{}", params.join("&"))
    }
}

/// Live explorer handler. Never touches the local store.
///
/// A remote failure renders the page without an event table.
#[instrument(skip(ctx, query), fields(shop = %ctx.shop))]
pub async fn index(
    CurrentShop(ctx): CurrentShop,
    Query(query): Query<ExploreQuery>,
) -> impl IntoResponse {
    let request = ExplorerRequest::from_params(
        query.page.as_deref(),
        query.page_info.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    );

    let today = Utc::now().date_naive();
    let (start, end) = (request.start, request.end);

    let fetched = explorer::fetch_live_page(&ctx, &request).await;
    let (events, previous_href, next_href) = match fetched {
        Some(page) => {
            let previous_href = page.page_info.previous.as_ref().map(|cursor| {
                explore_href(
                    Some(request.page.saturating_sub(1).max(1)),
                    Some(cursor),
                    start,
                    end,
                )
            });
            let next_href = page.page_info.next.as_ref().map(|cursor| {
                explore_href(Some(request.page.saturating_add(1)), Some(cursor), start, end)
            });
            let events = page.events.iter().map(LiveEventView::from).collect();
            (Some(events), previous_href, next_href)
        }
        None => (None, None, None),
    };

    ExploreTemplate {
        shop: ctx.shop.to_string(),
        current_path: EXPLORE_PATH.to_string(),
        page: request.page,
        selector: SelectorView::new(&request, today),
        events,
        previous_href,
        next_href,
        clear_href: explore_href(None, None, None, None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_href() {
        assert_eq!(explore_href(None, None, None, None), "/app/explore");
    }

    #[test]
    fn test_href_carries_cursor_and_dates() {
        let cursor = PageCursor::new(BTreeMap::from([
            ("limit".to_string(), "25".to_string()),
            ("page_info".to_string(), "abc".to_string()),
        ]));
        let href = explore_href(
            Some(2),
            Some(&cursor),
            Some(day(2024, 3, 1)),
            Some(day(2024, 3, 7)),
        );
        assert_eq!(
            href,
            "/app/explore?page=2&pageInfo=%7B%22limit%22%3A%2225%22%2C%22page_info%22%3A%22abc%22%7D\
             &startDate=2024-03-01&endDate=2024-03-07"
        );
    }

    #[test]
    fn test_unfiltered_selector_view() {
        let today = day(2024, 3, 10);
        let view = SelectorView::new(&ExplorerRequest::default(), today);
        assert_eq!(view.button_text, "All dates");
        assert_eq!(view.presets.len(), 3);
        assert!(view.presets.iter().all(|p| !p.active));
        assert_eq!(
            view.presets.first().unwrap().href,
            "/app/explore?startDate=2024-03-10&endDate=2024-03-10"
        );
    }

    #[test]
    fn test_preset_range_is_marked_active() {
        let today = day(2024, 3, 10);
        let request = ExplorerRequest {
            start: Some(day(2024, 3, 3)),
            end: Some(day(2024, 3, 9)),
            ..ExplorerRequest::default()
        };
        let view = SelectorView::new(&request, today);
        let active: Vec<&str> = view
            .presets
            .iter()
            .filter(|p| p.active)
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(active, vec!["Last 7 days"]);
        assert_eq!(view.button_text, "Last 7 days");
    }

    #[test]
    fn test_single_bound_stays_open_in_view_and_links() {
        let today = day(2024, 3, 10);
        let request = ExplorerRequest {
            start: Some(day(2024, 3, 5)),
            ..ExplorerRequest::default()
        };
        let view = SelectorView::new(&request, today);
        assert_eq!(view.button_text, "From 2024-03-05");
        assert_eq!(view.start_text, "2024-03-05");
        assert!(view.end_text.is_empty());
        assert!(view.presets.iter().all(|p| !p.active));

        let href = explore_href(Some(2), None, request.start, request.end);
        assert_eq!(href, "/app/explore?page=2&startDate=2024-03-05");
    }
}
