use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;

use crate::auth::{authorize, Identity, Role};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

/// The authenticated caller. Extraction fails with 401 when no valid token
/// is presented or its identity no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }

    /// Role gate for the current caller.
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        authorize(self.0.role, allowed)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or_else(ApiError::not_authorized)?;
        let user_id = state.tokens.verify(&token)?;
        let record = state
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(ApiError::not_authorized)?;
        Ok(CurrentUser(record.into()))
    }
}

/// Bearer header first, then the session cookie. The logout placeholder
/// value `none` counts as no token.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty() && v != "none")
}
