//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use amora_api::auth::AppStateInner;

pub const JWT_SECRET: &str = "test-secret";

/// Build the full app router over a fresh in-memory database. Uses the same
/// route table and middleware stack as the server binary.
pub fn build_test_app() -> (Router, Arc<AppStateInner>) {
    let db = amora_db::Database::open_in_memory().expect("in-memory db");
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: JWT_SECRET.to_string(),
    });
    (amora_api::app(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, token, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, token, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, token, Some(body)).await
}

/// Register a user through the API; returns (user_id, token).
pub async fn register_user(app: &Router, username: &str) -> (i64, String) {
    let (status, body) = post_json(
        app,
        "/api/register",
        None,
        &serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter2x",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Promote a user to admin directly in the database; the admin middleware
/// re-reads the flag on every request.
pub fn make_admin(state: &Arc<AppStateInner>, user_id: i64) {
    state
        .db
        .with_conn_mut(|conn| {
            conn.execute("UPDATE users SET is_admin = 1 WHERE id = ?1", [user_id])?;
            Ok(())
        })
        .unwrap();
}

pub struct SeededStory {
    pub story_id: i64,
    pub chapter_id: i64,
    pub scene1: i64,
    pub scene2: i64,
    pub input_scene: i64,
    pub free_choice: i64,
    pub premium_choice: i64,
    pub answer_choice: i64,
}

/// Author a small playable story through the admin API: two normal scenes
/// and a free-text scene, a legend-flagged free choice and an expensive
/// premium one.
pub async fn seed_story(app: &Router, admin_token: &str) -> SeededStory {
    let token = Some(admin_token);

    let (status, story) = post_json(
        app,
        "/api/stories",
        token,
        &serde_json::json!({ "story_key": "test_story", "title": "Test Story" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create story: {story}");
    let story_id = story["id"].as_i64().unwrap();

    let (status, chapter) = post_json(
        app,
        "/api/chapters",
        token,
        &serde_json::json!({ "story_id": story_id, "chapter_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create chapter: {chapter}");
    let chapter_id = chapter["id"].as_i64().unwrap();

    let mut scene_ids = Vec::new();
    for (number, scene_type, dialogue) in [
        (1, "normal", "Hi, {name}!"),
        (2, "normal", "A quiet evening."),
        (3, "input", "What is the password?"),
    ] {
        let (status, scene) = post_json(
            app,
            "/api/scenes",
            token,
            &serde_json::json!({
                "chapter_id": chapter_id,
                "scene_number": number,
                "scene_type": scene_type,
                "character_name": "Mira",
                "dialogue_text": dialogue,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create scene: {scene}");
        scene_ids.push(scene["id"].as_i64().unwrap());
    }
    let (scene1, scene2, input_scene) = (scene_ids[0], scene_ids[1], scene_ids[2]);

    let (status, free_choice) = post_json(
        app,
        "/api/choices",
        token,
        &serde_json::json!({
            "scene_id": scene1,
            "choice_number": 1,
            "choice_text": "Wave",
            "next_scene_id": scene2,
            "friendship_change": 2,
            "is_legend": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create choice: {free_choice}");

    let (status, premium_choice) = post_json(
        app,
        "/api/choices",
        token,
        &serde_json::json!({
            "scene_id": scene1,
            "choice_number": 2,
            "choice_text": "Rent a yacht",
            "next_scene_id": scene2,
            "premium": true,
            "diamonds_cost": 500,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create choice: {premium_choice}");

    let (status, answer_choice) = post_json(
        app,
        "/api/choices",
        token,
        &serde_json::json!({
            "scene_id": input_scene,
            "choice_number": 1,
            "choice_text": "swordfish",
            "next_scene_id": scene2,
            "teasing_change": 1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create choice: {answer_choice}");

    let (status, body) = put_json(
        app,
        &format!("/api/stories/{story_id}"),
        token,
        &serde_json::json!({ "is_published": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "publish story: {body}");

    SeededStory {
        story_id,
        chapter_id,
        scene1,
        scene2,
        input_scene,
        free_choice: free_choice["id"].as_i64().unwrap(),
        premium_choice: premium_choice["id"].as_i64().unwrap(),
        answer_choice: answer_choice["id"].as_i64().unwrap(),
    }
}
