//! Shoplog Core - Shared types library.
//!
//! This crate provides the types shared by every Shoplog component:
//! - `admin` - The embedded event log web application
//! - `cli` - Command-line tools for migrations and manual syncs
//!
//! # Architecture
//!
//! The core crate contains only types and pure state machines - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, shop domains, and emails
//! - [`pagination`] - Offset pagination requests and pages
//! - [`date_range`] - The date-range selector used to filter event views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod date_range;
pub mod pagination;
pub mod types;

pub use date_range::{DateRange, DateRangePreset, DateRangeSelector, SelectorState};
pub use pagination::{Page, PageRequest};
pub use types::*;
