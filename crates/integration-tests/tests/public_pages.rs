//! Public pages and the region picker endpoint.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The server running (cargo run -p rosewood-web)
//!
//! Run with: cargo test -p rosewood-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde::Deserialize;

use rosewood_integration_tests::{base_url, client, location};

#[derive(Debug, Deserialize)]
struct RegionName {
    cn_id: u32,
    name: String,
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_health_endpoints() {
    let client = client();
    for path in ["/health", "/health/ready"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_home_page_renders() {
    let resp = client().get(base_url()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Rosewood"));
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_region_cascade() {
    let client = client();

    let provinces: Vec<RegionName> = client
        .get(format!("{}/regions", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(provinces.len() >= 30);
    assert!(provinces.iter().all(|p| p.cn_id % 10_000 == 0));

    let beijing = provinces.iter().find(|p| p.name == "北京市").unwrap();
    let cities: Vec<RegionName> = client
        .get(format!("{}/regions?parent={}", base_url(), beijing.cn_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // Municipalities keep their own name for the single city level.
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].name, "北京市");
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_bad_region_code() {
    let resp = client()
        .get(format!("{}/regions?parent=12", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_missing_item() {
    let resp = client()
        .get(format!("{}/items/999999999", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_protected_pages_redirect_to_login() {
    let client = client();
    for (path, login) in [
        ("/user/profile", "/user/login"),
        ("/vendor/items", "/vendor/login"),
        ("/distributor/stock", "/distributor/login"),
        ("/privilege/revocations", "/privilege/login"),
    ] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert!(location(&resp).starts_with(login), "{path}");
    }
}
