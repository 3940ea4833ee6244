//! Rosewood Core - Shared domain types for the furniture marketplace.
//!
//! This crate provides common types used across all Rosewood components:
//! - `web` - Server-rendered marketplace (buyers, vendors, distributors, privileges)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, mobiles and statuses
//! - [`lazy`] - Memo slots for related-row lookups on model instances
//! - [`region`] - The embedded province/city/district table and its hierarchy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lazy;
pub mod region;
pub mod types;

pub use lazy::LazyField;
pub use types::*;
