//! Integration tests for the Shopify events client.
//!
//! A local axum server plays Shopify's `events.json` endpoint so the real
//! HTTP client, `Link` header parsing, and error mapping are exercised.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use shoplog_admin::db::MemoryEventStore;
use shoplog_admin::services::ShopContext;
use shoplog_admin::services::event_sync::sync_shop_events;
use shoplog_admin::shopify::{AdminClient, EventQuery, ShopifyError};
use shoplog_integration_tests::{at, serve, shop, shopify_config};
use url::Url;

const EVENTS_PATH: &str = "/admin/api/2024-10/events.json";

/// Requests seen by the fake server: query parameters and access token.
type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

fn event_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "subject_id": 1000 + id,
        "created_at": at(id).to_rfc3339(),
        "subject_type": "Product",
        "verb": "create",
        "arguments": [format!("Product {id}")],
        "body": null,
        "message": format!("Product {id} was created"),
        "author": "Shopify",
        "description": format!("Product {id} was created."),
        "path": format!("/admin/products/{}", 1000 + id)
    })
}

/// Two pages: the first links to the second through `page_info=p2`.
async fn paged_events(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = headers
        .get("x-shopify-access-token")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let second = params.get("page_info").map(String::as_str) == Some("p2");
    seen.lock().unwrap().push((params, token));

    let mut response_headers = HeaderMap::new();
    if second {
        response_headers.insert(
            header::LINK,
            "<https://acme.myshopify.com/admin/api/2024-10/events.json?limit=250&page_info=p1>; rel=\"previous\""
                .parse()
                .unwrap(),
        );
        (response_headers, Json(serde_json::json!({ "events": [event_json(3)] })))
    } else {
        response_headers.insert(
            header::LINK,
            "<https://acme.myshopify.com/admin/api/2024-10/events.json?limit=250&page_info=p2>; rel=\"next\""
                .parse()
                .unwrap(),
        );
        (
            response_headers,
            Json(serde_json::json!({ "events": [event_json(1), event_json(2)] })),
        )
    }
}

async fn client_for(router: Router) -> AdminClient {
    let addr = serve(router).await.unwrap();
    let base = Url::parse(&format!("http://{addr}/admin/api/2024-10")).unwrap();
    AdminClient::with_base_url(&shopify_config(), base).unwrap()
}

#[tokio::test]
async fn test_sync_walks_link_header_pages() {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(EVENTS_PATH, get(paged_events))
        .with_state(seen.clone());
    let client = client_for(router).await;

    let store = Arc::new(MemoryEventStore::new());
    let ctx = ShopContext::new(shop(), store.clone(), Arc::new(client));
    let report = sync_shop_events(&ctx, None).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.inserted, 3);
    assert_eq!(store.len().await, 3);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);

    let (first, token) = seen.first().unwrap();
    assert_eq!(first.get("limit").map(String::as_str), Some("250"));
    assert_eq!(
        first.get("created_at_min").map(String::as_str),
        Some("1970-01-01T00:00:00Z")
    );
    assert_eq!(token.as_deref(), Some("shpat_test_7f3a9c2e1b8d4f6a"));

    let (second, _) = seen.get(1).unwrap();
    assert_eq!(second.get("page_info").map(String::as_str), Some("p2"));
    assert_eq!(second.get("limit").map(String::as_str), Some("250"));
    assert!(!second.contains_key("created_at_min"));
}

#[tokio::test]
async fn test_previous_link_is_captured() {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route(EVENTS_PATH, get(paged_events))
        .with_state(seen);
    let client = client_for(router).await;

    let cursor = shoplog_integration_tests::cursor("p2", 250);
    let page = client
        .list_events(&EventQuery::at_cursor(cursor, 250))
        .await
        .unwrap();

    assert_eq!(page.events.len(), 1);
    assert!(page.page_info.next.is_none());
    assert_eq!(
        page.page_info.previous.unwrap().get("page_info"),
        Some("p1")
    );
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let router = Router::new().route(
        EVENTS_PATH,
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "2.5")], "") }),
    );
    let client = client_for(router).await;

    let result = client.list_events(&EventQuery::since(at(0), 250)).await;
    assert!(matches!(result, Err(ShopifyError::RateLimited(3))));
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let router = Router::new().route(
        EVENTS_PATH,
        get(|| async { (StatusCode::UNAUTHORIZED, "Invalid API key or access token") }),
    );
    let client = client_for(router).await;

    let result = client.list_events(&EventQuery::since(at(0), 250)).await;
    assert!(matches!(result, Err(ShopifyError::Unauthorized(_))));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let router = Router::new().route(
        EVENTS_PATH,
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = client_for(router).await;

    let result = client.list_events(&EventQuery::since(at(0), 250)).await;
    match result {
        Err(ShopifyError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let router = Router::new().route(EVENTS_PATH, get(|| async { "not json" }));
    let client = client_for(router).await;

    let result = client.list_events(&EventQuery::since(at(0), 250)).await;
    assert!(matches!(result, Err(ShopifyError::Parse(_))));
}
