use serde_json::{json, Value};

use crate::helpers::{error_message, spawn_app};

#[tokio::test]
async fn login_returns_the_users_token() {
    let app = spawn_app().await;
    let body = json!({
        "email": &app.test_user.email,
        "password": &app.test_user.password,
    });

    let response = app.post("/api/auth/token/login", &body, None).await;
    assert_eq!(response.status().as_u16(), 201);
    let token: Value = response.json().await.unwrap();
    assert_eq!(token["auth_token"], app.test_user.token.as_str());

    // A second login reuses the same key.
    let again: Value = app
        .post("/api/auth/token/login", &body, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["auth_token"], token["auth_token"]);
}

#[tokio::test]
async fn login_with_a_wrong_password_is_rejected() {
    let app = spawn_app().await;
    let body = json!({
        "email": &app.test_user.email,
        "password": "definitely not it",
    });

    let response = app.post("/api/auth/token/login", &body, None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        error_message(response).await,
        "Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn login_with_an_unknown_email_is_rejected() {
    let app = spawn_app().await;
    let body = json!({
        "email": "nobody@example.com",
        "password": "some password",
    });

    let response = app.post("/api/auth/token/login", &body, None).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = spawn_app().await;
    let token = app.test_user.token.as_str();

    let response = app
        .post("/api/auth/token/logout", &json!({}), Some(token))
        .await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get("/api/users/me", Some(token)).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn first_login_after_logout_issues_a_new_token() {
    let app = spawn_app().await;
    let old_token = app.test_user.token.as_str();
    app.post("/api/auth/token/logout", &json!({}), Some(old_token))
        .await;

    let body = json!({
        "email": &app.test_user.email,
        "password": &app.test_user.password,
    });
    let token: Value = app
        .post("/api/auth/token/login", &body, None)
        .await
        .json()
        .await
        .unwrap();
    let new_token = token["auth_token"].as_str().unwrap();
    assert_ne!(new_token, old_token);
    assert_eq!(new_token.len(), 40);

    let response = app.get("/api/users/me", Some(new_token)).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;
    for path in [
        "/api/users/me",
        "/api/users/subscriptions",
        "/api/recipes/download_shopping_cart",
    ] {
        let response = app.get(path, None).await;
        assert_eq!(response.status().as_u16(), 401, "GET {}", path);
        let body: Value = response.json().await.unwrap();
        assert!(body["errors"].is_string());
    }
}

#[tokio::test]
async fn public_routes_reject_a_malformed_token() {
    let app = spawn_app().await;

    let response = app.get("/api/recipes", Some("not-a-token")).await;
    assert_eq!(response.status().as_u16(), 401);

    let unknown = "a".repeat(40);
    let response = app.get("/api/recipes", Some(&unknown)).await;
    assert_eq!(response.status().as_u16(), 401);

    let response = app.get("/api/recipes", None).await;
    assert_eq!(response.status().as_u16(), 200);
}
