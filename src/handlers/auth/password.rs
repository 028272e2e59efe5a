// handlers/auth/password.rs - forgotten password flow

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::auth::{clear_reset_token, consume_reset_token, generate_reset_token, hash_password_blocking, store_reset_token};
use crate::database::models::{user::MIN_PASSWORD_LEN, validation::normalize_email, UserRecord};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, Body};
use crate::services::mailer::reset_password_email;
use crate::state::AppState;

use super::session::token_response;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

/// POST /api/v1/auth/forgetpassword - stores a reset digest and mails the
/// plain token. A failed send clears the digest again.
pub async fn forgot_password(
    State(state): State<AppState>,
    Body(request): Body<ForgotPasswordRequest>,
) -> ApiResult<String> {
    let email = request
        .email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please provide an email"))?;

    let users = state.users();
    let user: UserRecord = users
        .select_one(FilterData::matching(json!({ "email": email })))
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with that email"))?;

    let token = generate_reset_token();
    store_reset_token(&users, user.id, &token).await?;

    let reset_url = format!(
        "{}/api/v1/auth/resetpassword/{}",
        state.config.server.public_url.trim_end_matches('/'),
        token.plain
    );
    if let Err(e) = state.mailer.send(reset_password_email(&user.email, &reset_url)).await {
        error!(user_id = %user.id, "Reset email failed: {}", e);
        clear_reset_token(&users, user.id).await?;
        return Err(e.into());
    }

    info!(user_id = %user.id, "Password reset requested");
    Ok(ApiResponse::success("Email sent".to_string()))
}

/// PUT /api/v1/auth/resetpassword/:resettoken
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Body(request): Body<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let password = request
        .password
        .ok_or_else(|| ApiError::bad_request("Please add a password"))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation_error(
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            None,
        ));
    }

    let hash = hash_password_blocking(password, state.config.security.bcrypt_cost).await?;
    let user = consume_reset_token(&state.users(), &reset_token, hash).await?;
    info!(user_id = %user.id, "Password reset completed");

    token_response(&state, user.id, StatusCode::OK)
}
