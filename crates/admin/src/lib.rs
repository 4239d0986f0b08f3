//! Shoplog admin library.
//!
//! An embedded event log for one Shopify shop: copies the shop's events
//! into a local store, lists them page by page, and offers a live explorer
//! that reads straight from Shopify with a date-range filter.
//!
//! The binary in `main.rs` wires these modules into an axum server; the CLI
//! and integration tests use them directly.
//!
//! # Security
//!
//! Holds a Shopify Admin API token with `read_events` access. Keep the
//! server bound to a private interface.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
