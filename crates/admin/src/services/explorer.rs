//! Live event explorer: reads straight from Shopify, never touches the store.
//!
//! Filters arrive as `YYYY-MM-DD` days and become an inclusive UTC window,
//! from `00:00:00` on the start day to `23:59:59` on the end day. Paging uses
//! the opaque cursor from the previous response, round-tripped as JSON.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{error, instrument, warn};

use shoplog_core::DateRange;
use shoplog_core::date_range::parse_ymd;

use super::ShopContext;
use crate::shopify::{EventPage, EventQuery, PageCursor};

/// Events shown per explorer page.
pub const EXPLORER_PAGE_SIZE: u32 = 25;

/// A parsed explorer request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerRequest {
    /// 1-based page number, only used for display.
    pub page: u32,
    pub cursor: Option<PageCursor>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ExplorerRequest {
    /// Build a request from raw query parameters.
    ///
    /// Unparseable dates and cursors are logged and dropped. When both days
    /// are given out of order, the end is moved up to the start.
    #[must_use]
    pub fn from_params(
        page: Option<&str>,
        page_info: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);

        let cursor = page_info.and_then(|raw| match PageCursor::from_json(raw) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(error = %e, "Ignoring invalid pageInfo");
                None
            }
        });

        let start = parse_day("startDate", start_date);
        let mut end = parse_day("endDate", end_date);
        if let (Some(start), Some(end_day)) = (start, end) {
            end = Some(DateRange::clamped(start, end_day).end());
        }

        Self {
            page,
            cursor,
            start,
            end,
        }
    }

    /// The filtered days, when both bounds were given.
    #[must_use]
    pub fn range(&self) -> Option<DateRange> {
        self.start
            .zip(self.end)
            .map(|(start, end)| DateRange::clamped(start, end))
    }

    /// Whether any date filter is active.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// The Shopify query for this request.
    #[must_use]
    pub fn to_query(&self) -> EventQuery {
        EventQuery {
            limit: EXPLORER_PAGE_SIZE,
            created_at_min: self.start.map(start_of_day),
            created_at_max: self.end.and_then(end_of_day),
            cursor: self.cursor.clone(),
        }
    }
}

fn parse_day(name: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let day = parse_ymd(value);
    if day.is_none() {
        warn!(param = name, value, "Ignoring invalid date filter");
    }
    day
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
}

/// Fetch one live page.
///
/// Remote failures are logged and reported as `None`; the view then renders
/// an empty body instead of an error page.
#[instrument(skip(ctx, request), fields(shop = %ctx.shop, page = request.page))]
pub async fn fetch_live_page(ctx: &ShopContext, request: &ExplorerRequest) -> Option<EventPage> {
    match ctx.source.fetch_events(&request.to_query()).await {
        Ok(page) => Some(page),
        Err(e) => {
            error!(error = %e, "Live event fetch failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use shoplog_core::ShopDomain;

    use super::*;
    use crate::db::MemoryEventStore;
    use crate::shopify::{EventSource, ShopifyError};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let request = ExplorerRequest::from_params(None, None, None, None);
        assert_eq!(request.page, 1);
        assert!(request.cursor.is_none());
        assert!(!request.is_filtered());

        let query = request.to_query();
        assert_eq!(query.limit, EXPLORER_PAGE_SIZE);
        assert_eq!(query.created_at_min, None);
    }

    #[test]
    fn test_dates_become_inclusive_utc_window() {
        let request =
            ExplorerRequest::from_params(Some("2"), None, Some("2024-03-01"), Some("2024-03-07"));
        let query = request.to_query();
        assert_eq!(
            query.created_at_min,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            query.created_at_max,
            Some(Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap())
        );
        assert_eq!(request.page, 2);
    }

    #[test]
    fn test_out_of_order_end_snaps_to_start() {
        let request =
            ExplorerRequest::from_params(None, None, Some("2024-03-10"), Some("2024-03-01"));
        assert_eq!(request.end, Some(day(2024, 3, 10)));
        assert_eq!(request.range(), Some(DateRange::single(day(2024, 3, 10))));
    }

    #[test]
    fn test_invalid_inputs_are_ignored() {
        let request = ExplorerRequest::from_params(
            Some("-3"),
            Some("{not json"),
            Some("2024-13-40"),
            Some("2024-03-05"),
        );
        assert_eq!(request.page, 1);
        assert!(request.cursor.is_none());
        assert_eq!(request.start, None);
        assert_eq!(request.end, Some(day(2024, 3, 5)));
        assert_eq!(request.range(), None);
        assert!(request.is_filtered());
    }

    #[test]
    fn test_single_bound_leaves_other_side_open() {
        let request = ExplorerRequest::from_params(None, None, Some("2024-03-05"), None);
        assert_eq!(request.range(), None);

        let query = request.to_query();
        assert_eq!(
            query.created_at_min,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(query.created_at_max, None);
    }

    #[test]
    fn test_cursor_is_parsed() {
        let request = ExplorerRequest::from_params(
            Some("3"),
            Some(r#"{"limit":"25","page_info":"abc"}"#),
            None,
            None,
        );
        let query = request.to_query();
        assert_eq!(query.cursor.unwrap().get("page_info"), Some("abc"));
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        async fn fetch_events(&self, _query: &EventQuery) -> Result<EventPage, ShopifyError> {
            Err(ShopifyError::Unauthorized("revoked".to_string()))
        }
    }

    #[tokio::test]
    async fn test_remote_failure_yields_none() {
        let ctx = ShopContext::new(
            ShopDomain::parse("acme.myshopify.com").unwrap(),
            Arc::new(MemoryEventStore::new()),
            Arc::new(FailingSource),
        );
        assert!(fetch_live_page(&ctx, &ExplorerRequest::default()).await.is_none());
    }
}
