// handlers/auth/account.rs - the signed-in identity's own account

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Deserialize;

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::database::models::{user::MIN_PASSWORD_LEN, User, UserPayload};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Body, CurrentUser};
use crate::state::AppState;

use super::session::token_response;

#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(alias = "currentPassword")]
    pub current_password: Option<String>,
    #[serde(alias = "newPassword")]
    pub new_password: Option<String>,
}

/// GET /api/v1/auth/me
pub async fn me(user: CurrentUser) -> ApiResult<User> {
    Ok(ApiResponse::success(user.0))
}

/// PUT /api/v1/auth/updatedetails - name and email only.
pub async fn update_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Body(request): Body<DetailsRequest>,
) -> ApiResult<User> {
    let payload = UserPayload {
        name: request.name,
        email: request.email,
        ..Default::default()
    };
    payload.validate(true, false)?;

    let changes = payload.into_changes(None, None);
    if changes.is_empty() {
        return Ok(ApiResponse::success(user.0));
    }
    let updated = state.users().update_by_id(user.0.id, changes).await?;
    Ok(ApiResponse::success(updated.into()))
}

/// PUT /api/v1/auth/updatepassword - requires the current password and
/// issues a fresh token.
pub async fn update_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Body(request): Body<PasswordChangeRequest>,
) -> Result<Response, ApiError> {
    let (Some(current), Some(new_password)) = (request.current_password, request.new_password) else {
        return Err(ApiError::bad_request("Please provide the current and the new password"));
    };
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation_error(
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            None,
        ));
    }

    let users = state.users();
    let record = users.get_404(user.0.id).await?;
    if !verify_password_blocking(current, record.password).await? {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }

    let hash = hash_password_blocking(new_password, state.config.security.bcrypt_cost).await?;
    let payload = UserPayload::default();
    users.update_by_id(record.id, payload.into_changes(None, Some(hash))).await?;

    token_response(&state, record.id, StatusCode::OK)
}
