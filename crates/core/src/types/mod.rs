//! Core types for Shoplog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod shop;

pub use email::{Email, EmailError};
pub use id::*;
pub use shop::{ShopDomain, ShopDomainError};
