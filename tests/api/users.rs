use serde_json::{json, Value};

use crate::helpers::{error_message, spawn_app};

fn registration(username: &str, email: &str) -> Value {
    json!({
        "email": email,
        "username": username,
        "first_name": "Vasya",
        "last_name": "Pupkin",
        "password": "Qwerty123456",
    })
}

#[tokio::test]
async fn register_returns_the_user_without_password() {
    let app = spawn_app().await;

    let response = app
        .post("/api/users", &registration("vasya", "vasya@example.com"), None)
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["email"], "vasya@example.com");
    assert!(body["id"].is_i64());
    assert!(body.get("password").is_none());

    let login = json!({
        "email": "vasya@example.com",
        "password": "Qwerty123456",
    });
    let response = app.post("/api/auth/token/login", &login, None).await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn duplicate_username_or_email_is_rejected() {
    let app = spawn_app().await;
    app.post("/api/users", &registration("vasya", "vasya@example.com"), None)
        .await;

    let same_email = registration("petya", "vasya@example.com");
    let response = app.post("/api/users", &same_email, None).await;
    assert_eq!(response.status().as_u16(), 400);

    let same_username = registration("vasya", "other@example.com");
    let response = app.post("/api/users", &same_username, None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        error_message(response).await,
        "A user with that username or email already exists."
    );
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let app = spawn_app().await;
    let cases = [
        (registration("me", "me@example.com"), "reserved username"),
        (registration("vasya", "not-an-email"), "invalid email"),
        (registration("va sya", "vasya@example.com"), "space in username"),
        (json!({"email": "vasya@example.com"}), "missing fields"),
    ];
    for (body, description) in cases {
        let response = app.post("/api/users", &body, None).await;
        assert_eq!(response.status().as_u16(), 400, "{}", description);
    }
}

#[tokio::test]
async fn me_returns_the_current_user() {
    let app = spawn_app().await;

    let response = app
        .get("/api/users/me", Some(app.test_user.token.as_str()))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], app.test_user.id);
    assert_eq!(body["username"], app.test_user.username.as_str());
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = spawn_app().await;
    let response = app.get("/api/users/999999", None).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn users_list_is_paginated() {
    let app = spawn_app().await;
    for _ in 0..3 {
        app.create_user("user").await;
    }

    let body: Value = app
        .get("/api/users?page=1&limit=2", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 4);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], 2);
    assert!(body["previous"].is_null());
}

#[tokio::test]
async fn set_password_requires_the_current_password() {
    let app = spawn_app().await;
    let token = Some(app.test_user.token.as_str());

    let wrong = json!({
        "current_password": "not my password",
        "new_password": "a brand new password",
    });
    let response = app.post("/api/users/set_password", &wrong, token).await;
    assert_eq!(response.status().as_u16(), 400);

    let right = json!({
        "current_password": &app.test_user.password,
        "new_password": "a brand new password",
    });
    let response = app.post("/api/users/set_password", &right, token).await;
    assert_eq!(response.status().as_u16(), 204);

    let login = json!({
        "email": &app.test_user.email,
        "password": "a brand new password",
    });
    let response = app.post("/api/auth/token/login", &login, None).await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn a_short_new_password_is_rejected() {
    let app = spawn_app().await;
    let body = json!({
        "current_password": &app.test_user.password,
        "new_password": "short",
    });
    let token = Some(app.test_user.token.as_str());
    let response = app.post("/api/users/set_password", &body, token).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn only_admins_delete_users() {
    let app = spawn_app().await;
    let victim = app.create_user("user").await;
    let path = format!("/api/users/{}", victim.id);

    let response = app.delete(&path, Some(app.test_user.token.as_str())).await;
    assert_eq!(response.status().as_u16(), 403);

    let admin = app.create_user("admin").await;
    let response = app.delete(&path, Some(admin.token.as_str())).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get(&path, None).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_a_user_removes_their_recipes_and_relations() {
    let app = spawn_app().await;
    let admin = app.create_user("admin").await;
    let author = app.create_user("user").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let recipe = app
        .create_recipe(&author.token, "Soup", &[(salt, 5)], &[])
        .await;
    let recipe_id = recipe["id"].as_i64().unwrap();
    let reader = Some(app.test_user.token.as_str());
    let favorite = format!("/api/recipes/{}/favorite", recipe_id);
    app.post(&favorite, &json!({}), reader).await;
    let subscribe = format!("/api/users/{}/subscribe", author.id);
    app.post(&subscribe, &json!({}), reader).await;

    let response = app
        .delete(
            &format!("/api/users/{}", author.id),
            Some(admin.token.as_str()),
        )
        .await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get(&format!("/api/recipes/{}", recipe_id), None).await;
    assert_eq!(response.status().as_u16(), 404);
    let subscriptions: Value = app
        .get("/api/users/subscriptions", reader)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(subscriptions["count"], 0);
    let favorites: Value = app
        .get("/api/recipes?is_favorited=1", reader)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(favorites["count"], 0);
}
