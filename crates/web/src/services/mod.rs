//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login per account kind, registration, password resets
//! - `catalogue` - Item form parsing and validation
//! - `email` - Confirmation emails over SMTP
//! - `kv` - In-process key-value store with per-entry TTL
//! - `media` - Public URLs for stored media paths
//! - `registration` - The two-step registration wizard
//! - `reminds` - Dashboard notifications kept in the key-value store
//! - `tokens` - Single-use emailed confirmation tokens

pub mod auth;
pub mod catalogue;
pub mod email;
pub mod kv;
pub mod media;
pub mod registration;
pub mod reminds;
pub mod tokens;
