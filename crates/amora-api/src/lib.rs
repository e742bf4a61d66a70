pub mod admin;
pub mod auth;
pub mod error;
pub mod games;
pub mod middleware;
pub mod profile;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::auth::AppState;

/// Full API router. Shared between the server binary and the integration
/// tests so both exercise the same route table and middleware stack.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .with_state(state.clone());

    let player = Router::new()
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/games", get(games::list_games))
        .route("/api/games/{story_id}/access", get(games::check_access))
        .route("/api/games/{story_id}/purchase", post(games::purchase))
        .route("/api/games/{story_id}/scene", get(games::current_scene))
        .route("/api/games/{story_id}/choice", post(games::make_choice))
        .route("/api/games/{story_id}/input", post(games::make_input_choice))
        .route(
            "/api/games/{story_id}/to_next_scene",
            post(games::to_next_scene),
        )
        .route("/api/games/{story_id}/legends", get(games::legends))
        .route("/api/codes/{code}", post(games::redeem_code))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    let admin = Router::new()
        .route(
            "/api/stories",
            get(admin::list_stories).post(admin::create_story),
        )
        .route(
            "/api/stories/{story_id}",
            get(admin::get_story)
                .put(admin::update_story)
                .delete(admin::delete_story),
        )
        .route("/api/stories/{story_id}/export", get(admin::export_story))
        .route("/api/stories/import", post(admin::import_story))
        .route("/api/stories/{story_id}/chapters", get(admin::list_chapters))
        .route("/api/chapters", post(admin::create_chapter))
        .route(
            "/api/chapters/{chapter_id}",
            put(admin::update_chapter).delete(admin::delete_chapter),
        )
        .route("/api/chapters/{chapter_id}/scenes", get(admin::list_scenes))
        .route("/api/scenes", post(admin::create_scene))
        .route(
            "/api/scenes/{scene_id}",
            put(admin::update_scene).delete(admin::delete_scene),
        )
        .route("/api/scenes/{scene_id}/choices", get(admin::list_choices))
        .route("/api/choices", post(admin::create_choice))
        .route(
            "/api/choices/{choice_id}",
            get(admin::get_choice)
                .put(admin::update_choice)
                .delete(admin::delete_choice),
        )
        .route("/api/admin/teams", post(admin::create_team))
        .route("/api/admin/users/{user_id}/team", post(admin::assign_team))
        .route("/api/admin/codes", post(admin::create_code))
        .route(
            "/api/admin/users/{user_id}/reset-progress",
            post(admin::reset_progress),
        )
        // admin check runs after (inside) the auth check
        .layer(from_fn_with_state(state.clone(), middleware::require_admin))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public).merge(player).merge(admin)
}
