// handlers/auth/session.rs - register, login and logout

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::database::models::{validation::normalize_email, UserPayload, UserRecord};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::empty_data;
use crate::middleware::{ApiResponse, Body, TOKEN_COOKIE};
use crate::state::AppState;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Hash verified against when the email is unknown, so both login failures
/// cost one bcrypt verification.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Issues a session token for `user_id`: returned in the body and set as an
/// HTTP-only cookie.
pub fn token_response(state: &AppState, user_id: Uuid, status: StatusCode) -> Result<Response, ApiError> {
    let token = state.tokens.issue(user_id)?;
    let security = &state.config.security;
    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(security.cookie_expiry_days.saturating_mul(86_400)))
        .build();

    Ok((
        status,
        CookieJar::new().add(cookie),
        Json(json!({ "success": true, "token": token })),
    )
        .into_response())
}

/// POST /api/v1/auth/register
pub async fn register(State(state): State<AppState>, Body(payload): Body<UserPayload>) -> Result<Response, ApiError> {
    let role = payload.validate(false, false)?;
    let password = payload.password.clone().unwrap_or_default();
    let hash = hash_password_blocking(password, state.config.security.bcrypt_cost).await?;

    let user = state.users().insert(&payload.into_record(role, hash)).await?;
    info!(user_id = %user.id, role = %user.role, "Registered user");

    token_response(&state, user.id, StatusCode::CREATED)
}

/// POST /api/v1/auth/login
pub async fn login(State(state): State<AppState>, Body(request): Body<LoginRequest>) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let user: Option<UserRecord> = state
        .users()
        .select_one(FilterData::matching(json!({ "email": normalize_email(&email) })))
        .await?;

    let verified = match user {
        Some(ref user) => verify_password_blocking(password, user.password.clone()).await?,
        None => {
            let cost = state.config.security.bcrypt_cost;
            let dummy = DUMMY_HASH
                .get_or_try_init(|| hash_password_blocking("no-such-identity".to_string(), cost))
                .await?;
            let _ = verify_password_blocking(password, dummy.clone()).await;
            false
        }
    };

    match user {
        Some(user) if verified => token_response(&state, user.id, StatusCode::OK),
        _ => Err(ApiError::unauthorized(INVALID_CREDENTIALS)),
    }
}

/// GET /api/v1/auth/logout - overwrites the session cookie with a short-lived placeholder.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = Cookie::build((TOKEN_COOKIE, "none"))
        .path("/")
        .http_only(true)
        .secure(state.config.security.secure_cookies)
        .max_age(time::Duration::seconds(10))
        .build();

    (CookieJar::new().add(cookie), ApiResponse::success(empty_data()))
}
