use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use amora_types::api::{Claims, ProfileResponse, TeamInfo};

use crate::auth::AppState;
use crate::error::ApiError;

const THEMES: [&str; 3] = ["orange", "purple", "dark-green"];

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(claims.sub)?
        .ok_or(ApiError::NotFound("user"))?;

    let team = match user.team_id {
        Some(team_id) => state.db.get_team(team_id)?.map(|t| TeamInfo {
            id: t.id,
            name: t.name,
            is_leader: t.leader_id == Some(user.id),
        }),
        None => None,
    };

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        theme: user.theme,
        diamonds: user.diamonds,
        is_admin: user.is_admin,
        created_at: user.created_at,
        last_login: user.last_login,
        team,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub theme: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let display_name = match req.display_name.as_deref().map(str::trim) {
        Some(name) if name.len() < 2 => {
            return Err(ApiError::Validation(
                "display name must be at least 2 characters".to_string(),
            ));
        }
        other => other,
    };

    if let Some(theme) = req.theme.as_deref() {
        if !THEMES.contains(&theme) {
            return Err(ApiError::Validation(format!("unknown theme: {theme}")));
        }
    }

    state.db.with_conn_mut(|conn| {
        amora_db::queries::update_profile(
            conn,
            claims.sub,
            display_name,
            req.theme.as_deref(),
            req.avatar_url.as_deref().map(str::trim),
        )
    })?;

    get_profile(State(state), Extension(claims)).await
}
