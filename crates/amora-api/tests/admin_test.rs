mod common;

use axum::http::StatusCode;
use common::{build_test_app, get_json, make_admin, post_json, register_user, seed_story};
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let (app, _state) = build_test_app();
    let (_user_id, token) = register_user(&app, "ann").await;

    let body = json!({ "story_key": "x", "title": "X" });

    let (status, _) = post_json(&app, "/api/stories", None, &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(&app, "/api/stories", Some(&token), &body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_choice_destination_validation() {
    let (app, state) = build_test_app();
    let (admin_id, admin_token) = register_user(&app, "boss").await;
    make_admin(&state, admin_id);
    let story = seed_story(&app, &admin_token).await;

    // No destination at all.
    let (status, body) = post_json(
        &app,
        "/api/choices",
        Some(&admin_token),
        &json!({
            "scene_id": story.scene1,
            "choice_number": 8,
            "choice_text": "Nowhere",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // Both destinations at once.
    let (status, _) = post_json(
        &app,
        "/api/choices",
        Some(&admin_token),
        &json!({
            "scene_id": story.scene1,
            "choice_number": 8,
            "choice_text": "Everywhere",
            "next_scene_id": story.scene2,
            "next_chapter_id": story.chapter_id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A destination rooted in a different story.
    let (_, other) = post_json(
        &app,
        "/api/stories",
        Some(&admin_token),
        &json!({ "story_key": "other", "title": "Other" }),
    )
    .await;
    let (_, other_chapter) = post_json(
        &app,
        "/api/chapters",
        Some(&admin_token),
        &json!({ "story_id": other["id"], "chapter_number": 1 }),
    )
    .await;
    let (_, other_scene) = post_json(
        &app,
        "/api/scenes",
        Some(&admin_token),
        &json!({
            "chapter_id": other_chapter["id"],
            "scene_number": 1,
            "character_name": "Nia",
            "dialogue_text": "elsewhere",
        }),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/choices",
        Some(&admin_token),
        &json!({
            "scene_id": story.scene1,
            "choice_number": 8,
            "choice_text": "Hop stories",
            "next_scene_id": other_scene["id"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("different story"));
}

#[tokio::test]
async fn test_scene_type_is_validated() {
    let (app, state) = build_test_app();
    let (admin_id, admin_token) = register_user(&app, "boss").await;
    make_admin(&state, admin_id);
    let story = seed_story(&app, &admin_token).await;

    let (status, body) = post_json(
        &app,
        "/api/scenes",
        Some(&admin_token),
        &json!({
            "chapter_id": story.chapter_id,
            "scene_number": 9,
            "scene_type": "cutscene",
            "character_name": "Mira",
            "dialogue_text": "…",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("scene type"));
}

#[tokio::test]
async fn test_duplicate_numbers_are_rejected() {
    let (app, state) = build_test_app();
    let (admin_id, admin_token) = register_user(&app, "boss").await;
    make_admin(&state, admin_id);
    let story = seed_story(&app, &admin_token).await;

    let (status, _) = post_json(
        &app,
        "/api/chapters",
        Some(&admin_token),
        &json!({ "story_id": story.story_id, "chapter_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/scenes",
        Some(&admin_token),
        &json!({
            "chapter_id": story.chapter_id,
            "scene_number": 1,
            "character_name": "Mira",
            "dialogue_text": "again",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let (app, state) = build_test_app();
    let (admin_id, admin_token) = register_user(&app, "boss").await;
    make_admin(&state, admin_id);
    let story = seed_story(&app, &admin_token).await;

    let (status, mut doc) = get_json(
        &app,
        &format!("/api/stories/{}/export", story.story_id),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["story_key"], "test_story");
    assert_eq!(doc["chapters"][0]["scenes"].as_array().unwrap().len(), 3);

    doc["story_key"] = json!("test_story_copy");
    let (status, created) = post_json(&app, "/api/stories/import", Some(&admin_token), &doc).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (status, copy) = get_json(
        &app,
        &format!("/api/stories/{}/export", created["id"]),
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["chapters"], doc["chapters"]);
}

#[tokio::test]
async fn test_reset_progress_restarts_the_story() {
    let (app, state) = build_test_app();
    let (admin_id, admin_token) = register_user(&app, "boss").await;
    make_admin(&state, admin_id);
    let story = seed_story(&app, &admin_token).await;
    let (player_id, token) = register_user(&app, "ann").await;

    let (_, body) = post_json(
        &app,
        &format!("/api/games/{}/choice", story.story_id),
        Some(&token),
        &json!({ "choice_id": story.free_choice }),
    )
    .await;
    assert_eq!(body["success"], true);

    let (status, _) = post_json(
        &app,
        &format!("/api/admin/users/{player_id}/reset-progress"),
        Some(&admin_token),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The save is re-seeded at the story's opening scene.
    let (_, scene) = get_json(
        &app,
        &format!("/api/games/{}/scene", story.story_id),
        Some(&token),
    )
    .await;
    assert_eq!(scene["scene_id"], story.scene1);

    // History went with it.
    let (_, legends) = get_json(
        &app,
        &format!("/api/games/{}/legends", story.story_id),
        Some(&token),
    )
    .await;
    assert_eq!(legends.as_array().unwrap().len(), 0);
}
