use serde_json::{json, Value};

use crate::helpers::{error_message, recipe_body, spawn_app, PNG_DATA_URI};

#[tokio::test]
async fn create_returns_the_full_representation() {
    let app = spawn_app().await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let token = app.test_user.token.as_str();

    let recipe = app
        .create_recipe(token, "Omelette", &[(eggs, 3)], &[breakfast])
        .await;

    assert_eq!(recipe["name"], "Omelette");
    assert_eq!(recipe["cooking_time"], 15);
    assert_eq!(recipe["author"]["id"], app.test_user.id);
    assert_eq!(recipe["author"]["is_subscribed"], false);
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");
    assert_eq!(recipe["ingredients"][0]["id"], eggs);
    assert_eq!(recipe["ingredients"][0]["name"], "Eggs");
    assert_eq!(recipe["ingredients"][0]["measurement_unit"], "pcs");
    assert_eq!(recipe["ingredients"][0]["amount"], 3);
    assert_eq!(recipe["is_favorited"], false);
    assert_eq!(recipe["is_in_shopping_cart"], false);

    let image = recipe["image"].as_str().unwrap();
    let relative = image.split("/media/").nth(1).unwrap();
    assert!(relative.starts_with("recipes/"));
    assert!(relative.ends_with(".png"));
    assert!(app.media_root.join(relative).exists());
}

#[tokio::test]
async fn uploaded_images_are_served() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let recipe = app
        .create_recipe(&app.test_user.token, "Omelette", &[(eggs, 3)], &[])
        .await;
    let image = recipe["image"].as_str().unwrap();
    let path = format!("/media/{}", image.split("/media/").nth(1).unwrap());

    let response = app.get(&path, None).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn anonymous_users_cannot_create_recipes() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;

    let body = recipe_body("Omelette", &[(eggs, 3)], &[]);
    let response = app.post("/api/recipes", &body, None).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn a_duplicated_ingredient_is_named_in_the_error() {
    let app = spawn_app().await;
    let body = recipe_body("Omelette", &[(7, 1), (7, 2)], &[]);

    let response = app
        .post("/api/recipes", &body, Some(app.test_user.token.as_str()))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let message = error_message(response).await;
    assert!(message.contains('7'), "{}", message);
}

#[tokio::test]
async fn invalid_drafts_are_rejected() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let token = Some(app.test_user.token.as_str());

    let no_ingredients = recipe_body("Omelette", &[], &[]);
    let mut zero_time = recipe_body("Omelette", &[(eggs, 1)], &[]);
    zero_time["cooking_time"] = json!(0);
    let mut bad_image = recipe_body("Omelette", &[(eggs, 1)], &[]);
    bad_image["image"] = json!("http://example.com/picture.png");
    let unknown_ingredient = recipe_body("Omelette", &[(eggs + 1000, 1)], &[]);
    let unknown_tag = recipe_body("Omelette", &[(eggs, 1)], &[4242]);

    for (body, description) in [
        (no_ingredients, "no ingredients"),
        (zero_time, "zero cooking time"),
        (bad_image, "image is not a data uri"),
        (unknown_ingredient, "unknown ingredient"),
        (unknown_tag, "unknown tag"),
    ] {
        let response = app.post("/api/recipes", &body, token).await;
        assert_eq!(response.status().as_u16(), 400, "{}", description);
    }
}

#[tokio::test]
async fn identical_quantities_share_a_stored_amount() {
    let app = spawn_app().await;
    let flour = app.seed_ingredient("Flour", "g").await;
    let token = app.test_user.token.as_str();

    app.create_recipe(token, "Bread", &[(flour, 500)], &[]).await;
    app.create_recipe(token, "Pizza", &[(flour, 500)], &[]).await;

    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;
    use foodgram::schema::ingredient_amounts;
    let mut connection = app.connection().await;
    let stored: i64 = ingredient_amounts::table
        .filter(ingredient_amounts::ingredient_id.eq(flour))
        .count()
        .get_result(&mut connection)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn only_the_author_or_an_admin_may_update() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let milk = app.seed_ingredient("Milk", "ml").await;
    let recipe = app
        .create_recipe(&app.test_user.token, "Omelette", &[(eggs, 3)], &[])
        .await;
    let path = format!("/api/recipes/{}", recipe["id"]);
    let stranger = app.create_user("user").await;

    let patch = json!({"name": "Fluffy omelette"});
    let response =
        app.patch(&path, &patch, Some(stranger.token.as_str())).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.patch(&path, &patch, None).await;
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .patch(&path, &patch, Some(app.test_user.token.as_str()))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Fluffy omelette");
    assert_eq!(updated["ingredients"][0]["amount"], 3);

    let admin = app.create_user("admin").await;
    let patch = json!({"ingredients": [{"id": milk, "amount": 200}]});
    let response = app.patch(&path, &patch, Some(admin.token.as_str())).await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    let ingredients = updated["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Milk");
}

#[tokio::test]
async fn deleting_a_recipe_clears_its_relations() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    let author = app.create_user("user").await;
    let recipe = app
        .create_recipe(&author.token, "Omelette", &[(eggs, 3)], &[breakfast])
        .await;
    let id = recipe["id"].as_i64().unwrap();
    let reader = Some(app.test_user.token.as_str());
    let favorite = format!("/api/recipes/{}/favorite", id);
    let cart = format!("/api/recipes/{}/shopping_cart", id);
    app.post(&favorite, &json!({}), reader).await;
    app.post(&cart, &json!({}), reader).await;
    assert_eq!(app.relation_rows(app.test_user.id).await, (1, 1, 0));

    let path = format!("/api/recipes/{}", id);
    let response = app.delete(&path, reader).await;
    assert_eq!(response.status().as_u16(), 403);
    let response = app.delete(&path, Some(author.token.as_str())).await;
    assert_eq!(response.status().as_u16(), 204);

    assert_eq!(app.get(&path, None).await.status().as_u16(), 404);
    let list = app
        .get("/api/recipes/download_shopping_cart", reader)
        .await
        .text()
        .await
        .unwrap();
    assert!(list.is_empty());
    assert_eq!(app.relation_rows(app.test_user.id).await, (0, 0, 0));
    let ingredient = app.get(&format!("/api/ingredients/{}", eggs), None).await;
    assert_eq!(ingredient.status().as_u16(), 200);
    let tag = app.get(&format!("/api/tags/{}", breakfast), None).await;
    assert_eq!(tag.status().as_u16(), 200);
}

#[tokio::test]
async fn replaced_and_deleted_images_are_removed() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let token = app.test_user.token.as_str();
    let recipe = app.create_recipe(token, "Omelette", &[(eggs, 3)], &[]).await;
    let original = app.image_file(recipe["image"].as_str().unwrap());
    assert!(original.exists());
    let path = format!("/api/recipes/{}", recipe["id"]);

    let response = app
        .patch(&path, &json!({"name": "Fluffy omelette"}), Some(token))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(original.exists());

    let response = app
        .patch(&path, &json!({"image": PNG_DATA_URI}), Some(token))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    let replacement = app.image_file(updated["image"].as_str().unwrap());
    assert_ne!(replacement, original);
    assert!(replacement.exists());
    assert!(!original.exists());

    let response = app.delete(&path, Some(token)).await;
    assert_eq!(response.status().as_u16(), 204);
    assert!(!replacement.exists());
}

#[tokio::test]
async fn deleting_a_user_removes_their_images() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let author = app.create_user("user").await;
    let admin = app.create_user("admin").await;
    let recipe = app
        .create_recipe(&author.token, "Omelette", &[(eggs, 3)], &[])
        .await;
    let image = app.image_file(recipe["image"].as_str().unwrap());
    assert!(image.exists());

    let response = app
        .delete(
            &format!("/api/users/{}", author.id),
            Some(admin.token.as_str()),
        )
        .await;
    assert_eq!(response.status().as_u16(), 204);
    assert!(!image.exists());
}

#[tokio::test]
async fn a_page_far_past_the_end_is_empty() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    app.create_recipe(&app.test_user.token, "Omelette", &[(eggs, 3)], &[])
        .await;

    let response = app
        .get("/api/recipes?page=922337203685477580&limit=100", None)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["count"], 1);
    assert!(page["results"].as_array().unwrap().is_empty());
    assert!(page["next"].is_null());
}

#[tokio::test]
async fn recipes_are_listed_newest_first_and_paginated() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let token = app.test_user.token.as_str();
    for name in ["First", "Second", "Third"] {
        app.create_recipe(token, name, &[(eggs, 1)], &[]).await;
    }

    let page: Value = app
        .get("/api/recipes?limit=2", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["count"], 3);
    assert_eq!(page["next"], 2);
    assert_eq!(page["results"][0]["name"], "Third");
    assert_eq!(page["results"][1]["name"], "Second");

    let page: Value = app
        .get("/api/recipes?limit=2&page=2", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["results"][0]["name"], "First");
    assert_eq!(page["previous"], 1);
    assert!(page["next"].is_null());
}

#[tokio::test]
async fn recipes_are_filtered_by_author_and_tags() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let lunch = app.seed_tag("Lunch", "lunch").await;
    let dinner = app.seed_tag("Dinner", "dinner").await;
    let other = app.create_user("user").await;
    let token = app.test_user.token.as_str();
    app.create_recipe(token, "Soup", &[(eggs, 1)], &[lunch]).await;
    app.create_recipe(token, "Steak", &[(eggs, 1)], &[dinner]).await;
    app.create_recipe(&other.token, "Salad", &[(eggs, 1)], &[lunch, dinner])
        .await;

    let by_author: Value = app
        .get(&format!("/api/recipes?author={}", other.id), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_author["count"], 1);
    assert_eq!(by_author["results"][0]["name"], "Salad");

    let lunch_only: Value = app
        .get("/api/recipes?tags=lunch", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(lunch_only["count"], 2);

    let any_of: Value = app
        .get("/api/recipes?tags=lunch&tags=dinner", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(any_of["count"], 3);
}

#[tokio::test]
async fn relation_flags_filter_for_the_viewer_only() {
    let app = spawn_app().await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;
    let token = app.test_user.token.as_str();
    let liked = app.create_recipe(token, "Liked", &[(eggs, 1)], &[]).await;
    app.create_recipe(token, "Plain", &[(eggs, 1)], &[]).await;
    let favorite = format!("/api/recipes/{}/favorite", liked["id"]);
    app.post(&favorite, &json!({}), Some(token)).await;

    let favorited: Value = app
        .get("/api/recipes?is_favorited=1", Some(token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(favorited["count"], 1);
    assert_eq!(favorited["results"][0]["name"], "Liked");
    assert_eq!(favorited["results"][0]["is_favorited"], true);

    let not_favorited: Value = app
        .get("/api/recipes?is_favorited=0", Some(token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(not_favorited["count"], 1);
    assert_eq!(not_favorited["results"][0]["name"], "Plain");

    let anonymous: Value = app
        .get("/api/recipes?is_favorited=1", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(anonymous["count"], 2);
}

#[tokio::test]
async fn unknown_recipe_is_not_found() {
    let app = spawn_app().await;
    let response = app.get("/api/recipes/424242", None).await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(
        error_message(response).await,
        "Recipe 424242 does not exist."
    );
}

#[tokio::test]
async fn catalogue_is_browsable() {
    let app = spawn_app().await;
    app.seed_tag("Breakfast", "breakfast").await;
    let sugar = app.seed_ingredient("Sugar", "g").await;
    app.seed_ingredient("Salt", "g").await;
    app.seed_ingredient("Pepper", "g").await;

    let tags: Value = app.get("/api/tags", None).await.json().await.unwrap();
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let found: Value = app
        .get("/api/ingredients?name=s", None)
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Salt", "Sugar"]);

    let sugar: Value = app
        .get(&format!("/api/ingredients/{}", sugar), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(sugar["measurement_unit"], "g");

    let response = app.get("/api/tags/999", None).await;
    assert_eq!(response.status().as_u16(), 404);
}
