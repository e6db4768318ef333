mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_requires_username_and_password() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for payload in [json!({}), json!({"username": "boss"}), json!({"password": "x"})] {
        let res = client
            .post(format!("{}/login", server.base_url))
            .json(&payload)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body = res.json::<serde_json::Value>().await?;
        assert!(body.get("error").is_some(), "body {}", body);
    }

    Ok(())
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let unknown = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": "nobody", "password": "whatever"}))
        .send()
        .await?;
    let wrong = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": "boss", "password": "not-the-password"}))
        .send()
        .await?;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = unknown.json::<serde_json::Value>().await?;
    let wrong_body = wrong.json::<serde_json::Value>().await?;
    assert_eq!(unknown_body["error"], wrong_body["error"]);

    Ok(())
}

#[tokio::test]
async fn admin_login_returns_identity_bundle() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": "boss", "password": "boss-pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["username"], "boss");
    assert_eq!(body["isAdmin"], true);
    assert_eq!(body["mustChangePassword"], false);
    assert_eq!(body["reports"], json!([]));
    // Identity bundle only; no token, no hash
    assert!(body.get("password").is_none());
    assert!(body.get("token").is_none());

    Ok(())
}

#[tokio::test]
async fn migrated_legacy_user_logs_in_with_original_password() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // The seed file stored this password in plaintext; the startup migration
    // hashed it and flagged the account for a forced change
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": "legacy", "password": "old-pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["mustChangePassword"], true);
    assert_eq!(body["isAdmin"], false);

    Ok(())
}

#[tokio::test]
async fn forced_password_change_flow() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // First change without oldPassword (the forced first-login path)
    let res = client
        .post(format!("{}/change-password", server.base_url))
        .json(&json!({"username": "viewer", "newPassword": "fresh-pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("message").is_some());

    // The flag is cleared and the new password works
    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({"username": "viewer", "password": "fresh-pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["mustChangePassword"], false);

    // A later change with the wrong current password is rejected
    let res = client
        .post(format!("{}/change-password", server.base_url))
        .json(&json!({"username": "viewer", "oldPassword": "stale", "newPassword": "other"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // And with the right one it succeeds
    let res = client
        .post(format!("{}/change-password", server.base_url))
        .json(&json!({"username": "viewer", "oldPassword": "fresh-pw", "newPassword": "final-pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn change_password_error_shapes() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/change-password", server.base_url))
        .json(&json!({"username": "boss"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/change-password", server.base_url))
        .json(&json!({"username": "nobody", "newPassword": "pw"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
