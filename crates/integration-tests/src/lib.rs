//! Integration tests for Rosewood.
//!
//! The tests talk to a running server over HTTP and are `#[ignore]`d so that
//! `cargo test` stays self-contained.
//!
//! # Running Tests
//!
//! ```bash
//! rw-cli migrate && rw-cli seed reference --admin-password "$ROSEWOOD_TEST_ADMIN_PASSWORD"
//! rw-cli seed regions
//! cargo run -p rosewood-web &
//! cargo test -p rosewood-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ROSEWOOD_TEST_URL` - Server under test (default: `http://localhost:3000`)
//! - `ROSEWOOD_TEST_ADMIN_PASSWORD` - Password of the seeded `admin` account

use reqwest::{Client, redirect};

/// Base URL of the server under test, without trailing slash.
#[must_use]
pub fn base_url() -> String {
    std::env::var("ROSEWOOD_TEST_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A client that keeps session cookies and does not follow redirects, so
/// tests can assert where a response points.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A mobile number unlikely to be registered yet.
#[must_use]
pub fn unique_mobile() -> String {
    let digits = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("19{digits:09}")
}

/// Value of the `Location` header, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_mobile_is_valid() {
        for _ in 0..20 {
            assert!(rosewood_core::Mobile::parse(&unique_mobile()).is_ok());
        }
    }
}
