//! Vendor flows: registration addresses and distributor revocations.
//!
//! These tests require:
//! - A migrated database with reference data and regions seeded
//! - The server running (cargo run -p rosewood-web)
//!
//! Run with: cargo test -p rosewood-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::{Client, StatusCode};

use rosewood_integration_tests::{base_url, client, location, unique_mobile};

const PASSWORD: &str = "rosewood-cabinet-7";

/// 北京市东城区
const DONGCHENG: &str = "110101";

/// Well-formed, but no region carries this code.
const UNKNOWN_REGION: &str = "999999";

/// Accept a mobile at step 0 and post the detail form with `cn_id`.
async fn submit_vendor(client: &Client, cn_id: &str) -> reqwest::Response {
    let mobile = unique_mobile();
    let resp = client
        .post(format!("{}/vendor/register?form=mobile", base_url()))
        .form(&[("mobile", mobile.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let email = format!("{mobile}@vendors.example.com");
    let brand = format!("红木{}", &mobile[5..]);
    client
        .post(format!("{}/vendor/register", base_url()))
        .form(&[
            ("password", PASSWORD),
            ("confirm", PASSWORD),
            ("email", email.as_str()),
            ("agent_name", "王木匠"),
            ("agent_identity", "11010119800101123X"),
            ("name", brand.as_str()),
            ("license_limit", "2035/07/19"),
            ("telephone", "010-12345678"),
            ("cn_id", cn_id),
            ("address", "东四十条 1 号"),
        ])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_vendor_address_must_be_a_known_region() {
    let client = client();
    let resp = submit_vendor(&client, UNKNOWN_REGION).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let client = client_with_vendor().await;
    let resp = client
        .post(format!("{}/vendor/distributors", base_url()))
        .form(&distributor_form(UNKNOWN_REGION))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn distributor_form(cn_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("password", PASSWORD.to_string()),
        ("confirm", PASSWORD.to_string()),
        ("name", "东城门店".to_string()),
        ("contact", "李掌柜".to_string()),
        ("contact_telephone", "010-87654321".to_string()),
        ("contact_mobile", String::new()),
        ("cn_id", cn_id.to_string()),
        ("address", "王府井大街 8 号".to_string()),
    ]
}

/// A client logged in as a freshly registered vendor.
async fn client_with_vendor() -> Client {
    let client = client();
    let resp = submit_vendor(&client, DONGCHENG).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/vendor/profile");
    client
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_concurrent_revocations_conflict() {
    let client = client_with_vendor().await;

    let resp = client
        .post(format!("{}/vendor/distributors", base_url()))
        .form(&distributor_form(DONGCHENG))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();

    let marker = "/vendor/distributors/";
    let start = html.find(marker).unwrap() + marker.len();
    let id: String = html[start..].chars().take_while(char::is_ascii_digit).collect();
    let revoke_url = format!("{}/vendor/distributors/{id}/revoke", base_url());

    let file = || {
        client
            .post(&revoke_url)
            .form(&[("contract", "contracts/terminate.jpg")])
            .send()
    };
    let (first, second) = tokio::join!(file(), file());
    let mut statuses = [first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::SEE_OTHER, StatusCode::CONFLICT]);

    // A later filing is refused while the first is pending
    let resp = file().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
