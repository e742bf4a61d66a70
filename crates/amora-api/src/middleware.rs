use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use amora_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("authentication required".to_string())
}

/// Extract and validate the bearer JWT, stashing the claims in request
/// extensions for the handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| unauthorized())?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Admin gate. Runs inside `require_auth`; re-checks the flag against the
/// database rather than trusting a stale token.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(unauthorized)?;

    let user = state
        .db
        .get_user_by_id(claims.sub)?
        .ok_or_else(unauthorized)?;

    if !user.is_admin {
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}
