//! Integration tests for the live explorer page.
//!
//! The explorer reads Shopify directly; these tests check the request it
//! builds and that cursors survive the trip through the page's links.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use shoplog_admin::db::MemoryEventStore;
use shoplog_admin::routes::routes;
use shoplog_admin::services::explorer::EXPLORER_PAGE_SIZE;
use shoplog_admin::shopify::{PageCursor, PageInfo};
use shoplog_integration_tests::{ScriptedSource, app_state, cursor, page};
use tower::ServiceExt;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// The `pageInfo` value of the first link carrying one, URL-decoded.
fn page_info_in(body: &str) -> String {
    let start = body.find("pageInfo=").unwrap() + "pageInfo=".len();
    let rest = body.get(start..).unwrap();
    let end = rest.find(['&', '"']).unwrap();
    urlencoding::decode(rest.get(..end).unwrap()).unwrap().into_owned()
}

#[tokio::test]
async fn test_cursor_round_trips_through_page_links() {
    let next = cursor("eyJsYXN0X2lkIjo3fQ==", EXPLORER_PAGE_SIZE);
    let mut first = page(&[9, 8], None);
    first.page_info = PageInfo {
        next: Some(next.clone()),
        previous: None,
    };

    let store = Arc::new(MemoryEventStore::new());
    let source = Arc::new(ScriptedSource::new(vec![first, page(&[7], None)]));
    let app = routes().with_state(app_state(store.clone(), source.clone()));

    let (status, body) = get(app.clone(), "/app/explore").await;
    assert_eq!(status, StatusCode::OK);

    let json = page_info_in(&body);
    assert_eq!(PageCursor::from_json(&json).unwrap(), Some(next.clone()));

    let uri = format!("/app/explore?page=2&pageInfo={}", urlencoding::encode(&json));
    let (status, body) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Product 7 was created"));

    let queries = source.queries();
    assert_eq!(queries.get(1).unwrap().cursor, Some(next));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_date_filters_become_inclusive_bounds() {
    let store = Arc::new(MemoryEventStore::new());
    let source = Arc::new(ScriptedSource::new(vec![page(&[1], None)]));
    let app = routes().with_state(app_state(store, source.clone()));

    let (status, _) = get(app, "/app/explore?startDate=2024-03-01&endDate=2024-03-07").await;
    assert_eq!(status, StatusCode::OK);

    let query = source.queries().first().cloned().unwrap();
    assert_eq!(query.limit, EXPLORER_PAGE_SIZE);
    assert_eq!(
        query.created_at_min,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        query.created_at_max,
        Some(Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap())
    );
}

#[tokio::test]
async fn test_invalid_filters_are_ignored() {
    let store = Arc::new(MemoryEventStore::new());
    let source = Arc::new(ScriptedSource::new(vec![page(&[1], None)]));
    let app = routes().with_state(app_state(store, source.clone()));

    let (status, _) = get(app, "/app/explore?startDate=2024-13-40&pageInfo=%7Bbroken").await;
    assert_eq!(status, StatusCode::OK);

    let query = source.queries().first().cloned().unwrap();
    assert_eq!(query.created_at_min, None);
    assert!(query.cursor.is_none());
}

#[tokio::test]
async fn test_start_only_filter_keeps_end_open() {
    let first = page(&[4], Some(cursor("bmV4dA==", EXPLORER_PAGE_SIZE)));
    let store = Arc::new(MemoryEventStore::new());
    let source = Arc::new(ScriptedSource::new(vec![first]));
    let app = routes().with_state(app_state(store, source.clone()));

    let (status, body) = get(app, "/app/explore?startDate=2024-03-05").await;
    assert_eq!(status, StatusCode::OK);

    let query = source.queries().first().cloned().unwrap();
    assert_eq!(
        query.created_at_min,
        Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
    );
    assert_eq!(query.created_at_max, None);

    assert!(body.contains("From 2024-03-05"));
    assert!(body.contains("startDate=2024-03-05"));
    assert!(!body.contains("endDate=2024-03-05"));
}
