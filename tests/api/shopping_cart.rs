use serde_json::json;

use crate::helpers::spawn_app;

#[tokio::test]
async fn amounts_are_summed_across_recipes() {
    let app = spawn_app().await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let water = app.seed_ingredient("Water", "ml").await;
    let token = app.test_user.token.as_str();
    let soup = app
        .create_recipe(token, "Soup", &[(salt, 10), (water, 500)], &[])
        .await;
    let stew = app.create_recipe(token, "Stew", &[(salt, 5)], &[]).await;
    for recipe in [&soup, &stew] {
        let path = format!("/api/recipes/{}/shopping_cart", recipe["id"]);
        let response = app.post(&path, &json!({}), Some(token)).await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let response = app
        .get("/api/recipes/download_shopping_cart", Some(token))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with(&format!(
        "attachment; filename=\"{} shopping cart.txt\"",
        app.test_user.username
    )));

    let body = response.text().await.unwrap();
    assert_eq!(body, "• Salt (g) — 15\n• Water (ml) — 500\n");
}

#[tokio::test]
async fn an_empty_cart_gives_an_empty_list() {
    let app = spawn_app().await;
    let response = app
        .get(
            "/api/recipes/download_shopping_cart",
            Some(app.test_user.token.as_str()),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn only_the_viewers_cart_is_used() {
    let app = spawn_app().await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let other = app.create_user("user").await;
    let recipe = app
        .create_recipe(&other.token, "Soup", &[(salt, 10)], &[])
        .await;
    let path = format!("/api/recipes/{}/shopping_cart", recipe["id"]);
    app.post(&path, &json!({}), Some(other.token.as_str())).await;

    let mine = app
        .get(
            "/api/recipes/download_shopping_cart",
            Some(app.test_user.token.as_str()),
        )
        .await
        .text()
        .await
        .unwrap();
    assert_eq!(mine, "");

    let theirs = app
        .get(
            "/api/recipes/download_shopping_cart",
            Some(other.token.as_str()),
        )
        .await
        .text()
        .await
        .unwrap();
    assert_eq!(theirs, "• Salt (g) — 10\n");
}
