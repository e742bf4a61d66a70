mod common;

use axum::http::StatusCode;
use common::{build_test_app, get_json, post_json, register_user};
use serde_json::json;

#[tokio::test]
async fn test_register_grants_starting_diamonds() {
    let (app, _state) = build_test_app();

    let (status, body) = post_json(
        &app,
        "/api/register",
        None,
        &json!({ "username": "ann", "email": "ann@example.com", "password": "secret1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["diamonds"], 100);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_register_validation_rules() {
    let (app, _state) = build_test_app();

    let cases = [
        json!({ "username": "ab", "email": "a@b.c", "password": "secret1" }),
        json!({ "username": "ann", "email": "not-an-email", "password": "secret1" }),
        json!({ "username": "ann", "email": "a@b.c", "password": "short" }),
    ];
    for case in &cases {
        let (status, body) = post_json(&app, "/api/register", None, case).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}: {body}");
    }
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let (app, _state) = build_test_app();
    register_user(&app, "ann").await;

    let (status, body) = post_json(
        &app,
        "/api/register",
        None,
        &json!({ "username": "ann", "email": "other@example.com", "password": "secret1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("taken"));

    let (status, _) = post_json(
        &app,
        "/api/register",
        None,
        &json!({ "username": "ann2", "email": "ann@example.com", "password": "secret1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_username_or_email() {
    let (app, _state) = build_test_app();
    register_user(&app, "ann").await;

    for identifier in ["ann", "ann@example.com"] {
        let (status, body) = post_json(
            &app,
            "/api/login",
            None,
            &json!({ "identifier": identifier, "password": "hunter2x" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ann");
        assert_eq!(body["is_admin"], false);
    }
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (app, _state) = build_test_app();
    register_user(&app, "ann").await;

    let (status, _) = post_json(
        &app,
        "/api/login",
        None,
        &json!({ "identifier": "ann", "password": "wrong-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_five_failures_lock_the_account() {
    let (app, _state) = build_test_app();
    register_user(&app, "ann").await;

    let bad = json!({ "identifier": "ann", "password": "wrong-pass" });
    for _ in 0..4 {
        let (status, _) = post_json(&app, "/api/login", None, &bad).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = post_json(&app, "/api/login", None, &bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("locked"));

    // The right password does not help while the lockout is active.
    let (status, body) = post_json(
        &app,
        "/api/login",
        None,
        &json!({ "identifier": "ann", "password": "hunter2x" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("locked"));
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let (app, _state) = build_test_app();

    let (status, _) = get_json(&app, "/api/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(&app, "/api/profile", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_round_trip() {
    let (app, _state) = build_test_app();
    let (user_id, token) = register_user(&app, "ann").await;

    let (status, body) = get_json(&app, "/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["display_name"], "ann");
    assert!(body["team"].is_null());

    let (status, body) = common::put_json(
        &app,
        "/api/profile",
        Some(&token),
        &json!({ "display_name": "Annie", "theme": "purple" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Annie");
    assert_eq!(body["theme"], "purple");

    let (status, body) = common::put_json(
        &app,
        "/api/profile",
        Some(&token),
        &json!({ "theme": "neon" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("theme"));
}
