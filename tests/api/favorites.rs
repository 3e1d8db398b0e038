use serde_json::{json, Value};

use crate::helpers::{error_message, spawn_app, TestApp};

async fn recipe_id(app: &TestApp) -> i64 {
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let author = app.create_user("user").await;
    let recipe = app
        .create_recipe(&author.token, "Omelette", &[(eggs, 2)], &[])
        .await;
    recipe["id"].as_i64().unwrap()
}

#[tokio::test]
async fn adding_a_favorite_returns_the_summary() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;
    let token = Some(app.test_user.token.as_str());

    let response = app
        .post(&format!("/api/recipes/{}/favorite", id), &json!({}), token)
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["id"], id);
    assert_eq!(summary["name"], "Omelette");
    assert_eq!(summary["cooking_time"], 15);
    assert!(summary["image"].as_str().unwrap().contains("/media/recipes/"));
    assert!(summary.get("ingredients").is_none());

    let detail: Value = app
        .get(&format!("/api/recipes/{}", id), token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["is_favorited"], true);
    assert_eq!(detail["is_in_shopping_cart"], false);
}

#[tokio::test]
async fn a_second_add_is_a_duplicate() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;
    let token = Some(app.test_user.token.as_str());
    let path = format!("/api/recipes/{}/favorite", id);

    app.post(&path, &json!({}), token).await;
    let response = app.post(&path, &json!({}), token).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        error_message(response).await,
        "Recipe is already in the favorites."
    );
}

#[tokio::test]
async fn removing_twice_fails_the_second_time() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;
    let token = Some(app.test_user.token.as_str());
    let path = format!("/api/recipes/{}/favorite", id);
    app.post(&path, &json!({}), token).await;

    let response = app.delete(&path, token).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.delete(&path, token).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        error_message(response).await,
        "Recipe is not in the favorites."
    );
}

#[tokio::test]
async fn lists_are_independent() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;
    let token = Some(app.test_user.token.as_str());

    app.post(&format!("/api/recipes/{}/favorite", id), &json!({}), token)
        .await;
    let response = app
        .delete(&format!("/api/recipes/{}/shopping_cart", id), token)
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .post(&format!("/api/recipes/{}/shopping_cart", id), &json!({}), token)
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn favorites_of_one_user_are_invisible_to_another() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;
    let other = app.create_user("user").await;
    app.post(
        &format!("/api/recipes/{}/favorite", id),
        &json!({}),
        Some(app.test_user.token.as_str()),
    )
    .await;

    let detail: Value = app
        .get(&format!("/api/recipes/{}", id), Some(other.token.as_str()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["is_favorited"], false);

    let anonymous: Value = app
        .get(&format!("/api/recipes/{}", id), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(anonymous["is_favorited"], false);
}

#[tokio::test]
async fn missing_recipe_is_not_found() {
    let app = spawn_app().await;
    let token = Some(app.test_user.token.as_str());

    let response = app
        .post("/api/recipes/987654/favorite", &json!({}), token)
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app.delete("/api/recipes/987654/shopping_cart", token).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn relations_require_authentication() {
    let app = spawn_app().await;
    let id = recipe_id(&app).await;

    let response = app
        .post(&format!("/api/recipes/{}/favorite", id), &json!({}), None)
        .await;
    assert_eq!(response.status().as_u16(), 401);
    let response = app
        .delete(&format!("/api/recipes/{}/shopping_cart", id), None)
        .await;
    assert_eq!(response.status().as_u16(), 401);
    let response = app
        .post(&format!("/api/recipes/{}/shopping_cart", id), &json!({}), None)
        .await;
    assert_eq!(response.status().as_u16(), 401);

    assert_eq!(app.relation_rows(app.test_user.id).await, (0, 0, 0));
}
