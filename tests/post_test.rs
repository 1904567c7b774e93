mod common;

use serde_json::Value;

#[tokio::test]
async fn create_and_list_posts() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "iris", "iris@example.com", "password_123").await;

    let form = common::post_form("Sunset over the bay", user_id, Some(common::png_bytes()));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["post"]["title"], "Sunset over the bay");
    assert_eq!(body["post"]["username"], "iris");
    assert!(body["post"]["imageUrl"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/posts/"));
    let post_id = body["post"]["id"].as_i64().unwrap();

    let resp = app.client.get(app.url("/posts")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let posts: Value = resp.json().await.unwrap();
    let listed = posts
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"].as_i64() == Some(post_id))
        .expect("created post should appear in the listing");
    assert_eq!(listed["title"], "Sunset over the bay");
    assert_eq!(listed["username"], "iris");
    assert_eq!(listed["likedBy"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_post_accepts_three_megabyte_image() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "quinn", "quinn@example.com", "password_123").await;

    let image = common::png_bytes_sized(3 * 1024 * 1024);
    let form = common::post_form("Big panorama", user_id, Some(image));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["post"]["title"], "Big panorama");
}

#[tokio::test]
async fn create_post_rejects_oversize_image() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "ruth", "ruth@example.com", "password_123").await;

    let image = common::png_bytes_sized(6 * 1024 * 1024);
    let form = common::post_form("Too big", user_id, Some(image));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "PayloadTooLarge");
}

#[tokio::test]
async fn create_post_for_unknown_user_leaves_no_file_behind() {
    let app = common::spawn_app().await;

    let form = common::post_form("Orphan image", 999_999, Some(common::png_bytes()));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "ValidationError");

    assert_eq!(common::stored_post_images(&app), 0);
}

#[tokio::test]
async fn create_post_without_image_fails() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "judy", "judy@example.com", "password_123").await;

    let form = common::post_form("No photo here", user_id, None);
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "MissingImage");
}

#[tokio::test]
async fn create_post_rejects_mismatched_image_type() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "kate", "kate@example.com", "password_123").await;

    // Declared PNG, but the bytes are not a PNG.
    let form = common::post_form("Fake image", user_id, Some(vec![0u8; 32]));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn like_toggle_twice_restores_original_set() {
    let app = common::spawn_app().await;

    let owner_id =
        common::register_verified_user(&app, "liam", "liam@example.com", "password_123").await;
    let form = common::post_form("Toggle me", owner_id, Some(common::png_bytes()));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let post_id = body["post"]["id"].as_i64().unwrap();

    // First toggle adds
    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .json(&serde_json::json!({ "user_id": owner_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["post"]["likedBy"].as_array().unwrap(),
        &vec![Value::from(owner_id)]
    );

    // Second toggle removes
    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .json(&serde_json::json!({ "user_id": owner_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["post"]["likedBy"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn likes_from_different_users_both_land() {
    let app = common::spawn_app().await;

    let owner_id =
        common::register_verified_user(&app, "mary", "mary@example.com", "password_123").await;
    let other_id =
        common::register_verified_user(&app, "nick", "nick@example.com", "password_123").await;

    let form = common::post_form("Popular", owner_id, Some(common::png_bytes()));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let post_id = body["post"]["id"].as_i64().unwrap();

    let (first, second) = tokio::join!(
        app.client
            .post(app.url(&format!("/posts/{}/like", post_id)))
            .json(&serde_json::json!({ "user_id": owner_id }))
            .send(),
        app.client
            .post(app.url(&format!("/posts/{}/like", post_id)))
            .json(&serde_json::json!({ "user_id": other_id }))
            .send(),
    );
    assert_eq!(first.unwrap().status(), 200);
    assert_eq!(second.unwrap().status(), 200);

    let resp = app.client.get(app.url("/posts")).send().await.unwrap();
    let posts: Value = resp.json().await.unwrap();
    let listed = posts
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"].as_i64() == Some(post_id))
        .expect("post should appear in the listing");
    let liked_by = listed["likedBy"].as_array().unwrap();
    assert_eq!(liked_by.len(), 2);
    assert!(liked_by.contains(&Value::from(owner_id)));
    assert!(liked_by.contains(&Value::from(other_id)));
}

#[tokio::test]
async fn save_toggle_round_trip() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "olga", "olga@example.com", "password_123").await;
    let form = common::post_form("Keep this one", user_id, Some(common::png_bytes()));
    let resp = app
        .client
        .post(app.url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let post_id = body["post"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/save", post_id)))
        .json(&serde_json::json!({ "user_id": user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["savedPosts"].as_array().unwrap(),
        &vec![Value::from(post_id)]
    );

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/save", post_id)))
        .json(&serde_json::json!({ "user_id": user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["savedPosts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn like_unknown_post_is_not_found() {
    let app = common::spawn_app().await;

    let user_id =
        common::register_verified_user(&app, "pete", "pete@example.com", "password_123").await;

    let resp = app
        .client
        .post(app.url("/posts/999999/like"))
        .json(&serde_json::json!({ "user_id": user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "NotFound");
}
