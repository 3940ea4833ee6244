//! Account flows: buyer registration, login and logout, administrator login.
//!
//! These tests require:
//! - A migrated database with reference data and regions seeded
//! - The server running (cargo run -p rosewood-web)
//!
//! Run with: cargo test -p rosewood-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;

use rosewood_integration_tests::{base_url, client, location, unique_mobile};

const PASSWORD: &str = "rosewood-table-42";

/// Run the two-step mobile wizard on a fresh client, which stays logged in.
async fn register_buyer(mobile: &str, password: &str, nickname: &str) -> reqwest::Client {
    let client = client();
    let resp = client
        .post(format!("{}/user/register?form=mobile", base_url()))
        .form(&[("mobile", mobile)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{}/user/register", base_url()))
        .form(&[("password", password), ("confirm", password), ("nickname", nickname)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    client
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_buyer_registers_by_mobile_and_logs_in() {
    let client = client();
    let mobile = unique_mobile();

    // Step 0: the mobile number
    let resp = client
        .post(format!("{}/user/register?form=mobile", base_url()))
        .form(&[("mobile", mobile.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/user/register");

    let resp = client
        .get(format!("{}/user/register", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains(&mobile[7..]), "step 1 shows the masked mobile");

    // Step 1: password, nickname left empty so a username is generated
    let resp = client
        .post(format!("{}/user/register", base_url()))
        .form(&[("password", PASSWORD), ("confirm", PASSWORD), ("nickname", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/user/profile", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Logout ends the session
    let resp = client
        .post(format!("{}/user/logout", base_url()))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let resp = client
        .get(format!("{}/user/profile", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Mobile login
    let resp = client
        .post(format!("{}/user/login?next=/user/orders", base_url()))
        .form(&[("login", mobile.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/user/orders");
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_nickname_cannot_capture_another_mobile_login() {
    let taken = unique_mobile();

    // An older buyer picks the other buyer's mobile number as nickname
    register_buyer(&unique_mobile(), "first-buyer-pass", &taken).await;
    register_buyer(&taken, PASSWORD, "").await;

    let resp = client()
        .post(format!("{}/user/login", base_url()))
        .form(&[("login", taken.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client()
        .post(format!("{}/user/login", base_url()))
        .form(&[("login", taken.as_str()), ("password", "first-buyer-pass")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_login_ignores_backslash_next() {
    let mobile = unique_mobile();
    register_buyer(&mobile, PASSWORD, "").await;

    let resp = client()
        .post(format!("{}/user/login?next=%2F%5Cevil.test%2Fphish", base_url()))
        .form(&[("login", mobile.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(!location(&resp).contains("evil.test"));
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_wrong_password_is_rejected() {
    let resp = client()
        .post(format!("{}/user/login", base_url()))
        .form(&[("login", "13800000000"), ("password", "not-the-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_reg_email_rejects_bad_address() {
    let resp = client()
        .post(format!("{}/user/reg_email", base_url()))
        .form(&[
            ("email", "not-an-email"),
            ("password", PASSWORD),
            ("confirm", PASSWORD),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.text().await.unwrap(), "false");
}

#[tokio::test]
#[ignore = "requires a running server and ROSEWOOD_TEST_ADMIN_PASSWORD"]
async fn test_administrator_sees_review_queues() {
    let Ok(password) = std::env::var("ROSEWOOD_TEST_ADMIN_PASSWORD") else {
        return;
    };
    let client = client();

    let resp = client
        .post(format!("{}/privilege/login", base_url()))
        .form(&[("login", "admin"), ("password", password.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/privilege/vendors");

    for path in ["/privilege/vendors", "/privilege/revocations"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }

    // An administrator session is not a vendor session.
    let resp = client
        .get(format!("{}/vendor/profile", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}
