use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::warn;

use amora_db::Database;
use amora_db::models::UserRow;
use amora_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Diamonds granted to every fresh account.
pub const STARTING_DIAMONDS: i64 = 100;

const MAX_FAILED_LOGINS: i64 = 5;
const LOCKOUT_MINUTES: i64 = 15;
const TOKEN_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    let email = req.email.trim();

    // Validate input
    if username.len() < 3 {
        return Err(ApiError::Validation(
            "username must be at least 3 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("invalid email format".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }

    if state.db.get_user_by_username(username)?.is_some() {
        return Err(ApiError::Validation(
            "username is already taken".to_string(),
        ));
    }
    if state.db.get_user_by_email(email)?.is_some() {
        return Err(ApiError::Validation(
            "email is already registered".to_string(),
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username);

    let user_id = state.db.create_user(
        username,
        email,
        &password_hash,
        display_name,
        STARTING_DIAMONDS,
    )?;

    let token = create_token(&state.jwt_secret, user_id, username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            token,
            diamonds: STARTING_DIAMONDS,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = req.identifier.trim();

    let user = match state.db.get_user_by_username(identifier)? {
        Some(user) => Some(user),
        None => state.db.get_user_by_email(identifier)?,
    };
    let user = user.ok_or_else(invalid_credentials)?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("account is disabled".to_string()));
    }

    if let Some(minutes) = lockout_remaining(&user) {
        return Err(ApiError::Unauthorized(format!(
            "Account is locked. Try again in {minutes} minutes"
        )));
    }

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is corrupt: {e}"))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        let attempts = user.failed_login_attempts + 1;

        if attempts >= MAX_FAILED_LOGINS {
            let until = (Utc::now() + chrono::Duration::minutes(LOCKOUT_MINUTES)).to_rfc3339();
            state
                .db
                .record_login_failure(user.id, attempts, Some(&until))?;
            warn!(user_id = user.id, "account locked after repeated failures");
            return Err(ApiError::Unauthorized(format!(
                "Too many failed attempts. Account locked for {LOCKOUT_MINUTES} minutes"
            )));
        }

        state.db.record_login_failure(user.id, attempts, None)?;
        return Err(invalid_credentials());
    }

    state
        .db
        .record_login_success(user.id, &Utc::now().to_rfc3339())?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
        diamonds: user.diamonds,
        is_admin: user.is_admin,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid login or password".to_string())
}

/// Minutes left on an active lockout, rounded up; None when not locked.
fn lockout_remaining(user: &UserRow) -> Option<i64> {
    let until = user.locked_until.as_deref()?;
    let until = chrono::DateTime::parse_from_rfc3339(until).ok()?;
    let remaining = until.signed_duration_since(Utc::now());
    if remaining <= chrono::Duration::zero() {
        return None;
    }
    Some((remaining.num_seconds() + 59) / 60)
}

fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (Utc::now() + chrono::Duration::days(TOKEN_DAYS)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
