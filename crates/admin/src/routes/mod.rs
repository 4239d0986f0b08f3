//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Redirect to /app
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (store ping)
//!
//! # Stored events
//! GET  /app?page=&pageSize=       - Sync with Shopify, then list stored events
//! GET  /app/event/{id}            - Detail by local key
//! GET  /app/remote-event/{id}     - Detail by Shopify event id
//!
//! # Live events
//! GET  /app/explore?page=&pageInfo=&startDate=&endDate=
//! ```

pub mod events;
pub mod explore;
pub mod health;

use axum::{Router, response::Redirect, routing::get};

use crate::state::AppState;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/app") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/app", get(events::index))
        .route("/app/event/{id}", get(events::show))
        .route("/app/remote-event/{event_id}", get(events::show_remote))
        .route("/app/explore", get(explore::index))
}
