//! Player-facing game endpoints: catalog, access, purchase, scene reads and
//! the choice/advance write paths.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use amora_game::choice::ChoiceOutcome;
use amora_game::{access, choice, scene};
use amora_types::api::{
    AccessResponse, ChoiceRequest, ChoiceResponse, Claims, GameSummary, InputChoiceRequest,
    LegendEntry, PurchaseResponse, RedeemResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_games(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let stories = state.db.list_stories(true)?;

    let games = stories
        .into_iter()
        .map(|story| GameSummary {
            id: story.id,
            key: story.story_key,
            title: story.title,
            description: story.description,
            chapters: story.chapters_count,
            premium: story.premium,
            diamonds_cost: story.diamonds_cost,
        })
        .collect();

    Ok(Json(games))
}

pub async fn check_access(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AccessResponse>, ApiError> {
    let decision = access::check(&state.db, claims.sub, story_id)?;

    Ok(Json(AccessResponse {
        accessible: decision.accessible,
        message: decision.message,
    }))
}

pub async fn purchase(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let outcome = access::purchase(&state.db, claims.sub, story_id)?;

    Ok(Json(PurchaseResponse {
        success: outcome.success,
        message: outcome.message,
        diamonds: outcome.diamonds,
    }))
}

pub async fn current_scene(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let decision = access::check(&state.db, claims.sub, story_id)?;
    if !decision.accessible {
        return Err(ApiError::Forbidden);
    }

    let view = scene::current(&state.db, claims.sub, story_id)?;
    Ok(Json(view))
}

pub async fn make_choice(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChoiceRequest>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let outcome = choice::apply(&state.db, claims.sub, story_id, req.choice_id)?;
    respond(&state, claims.sub, story_id, outcome)
}

pub async fn make_input_choice(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<InputChoiceRequest>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let outcome = choice::apply_input(&state.db, claims.sub, story_id, &req.text)?;
    respond(&state, claims.sub, story_id, outcome)
}

pub async fn to_next_scene(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let outcome = scene::advance_linear(&state.db, claims.sub, story_id)?;
    respond(&state, claims.sub, story_id, outcome)
}

/// Shared response shape for the write paths: a successful advance carries
/// the freshly projected scene, a refusal only the reason.
fn respond(
    state: &AppState,
    user_id: i64,
    story_id: i64,
    outcome: ChoiceOutcome,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let next_scene = if outcome.success {
        Some(scene::current(&state.db, user_id, story_id)?)
    } else {
        None
    };

    Ok(Json(ChoiceResponse {
        success: outcome.success,
        message: outcome.message,
        scene_id: outcome.scene_id,
        chapter_id: outcome.chapter_id,
        next_scene,
    }))
}

pub async fn legends(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<LegendEntry>>, ApiError> {
    let rows = state.db.get_legend_history(claims.sub, story_id)?;

    let legends = rows
        .into_iter()
        .map(|(choice_id, choice_text, made_at)| LegendEntry {
            choice_id,
            choice_text,
            made_at,
        })
        .collect();

    Ok(Json(legends))
}

pub async fn redeem_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let Some(value) = state.db.redeem_diamond_code(claims.sub, &code)? else {
        return Err(ApiError::NotFound("code"));
    };

    let balance = state
        .db
        .get_user_by_id(claims.sub)?
        .map(|u| u.diamonds)
        .unwrap_or(0);

    Ok(Json(RedeemResponse {
        success: true,
        message: format!("{value} diamonds added"),
        diamonds: balance,
    }))
}
