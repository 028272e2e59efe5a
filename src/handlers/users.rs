// handlers/users.rs - /api/v1/users, admin only

use std::collections::BTreeSet;

use axum::{
    extract::{Path, RawQuery, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password_blocking, Role};
use crate::database::models::{Course, Review, User, UserPayload};
use crate::database::USERS;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, Body, CurrentUser};
use crate::query::{advanced_results, AdvancedResults, QueryParams};
use crate::services::refresh_bootcamp_averages;
use crate::state::AppState;

use super::{empty_data, parse_id};

const ADMINS: &[Role] = &[Role::Admin];

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    RawQuery(query): RawQuery,
) -> Result<Json<AdvancedResults>, ApiError> {
    user.require(ADMINS)?;
    let params = QueryParams::parse(query.as_deref());
    let results = advanced_results(state.store.as_ref(), &USERS, &params, &[], &state.config.filter).await?;
    Ok(Json(results))
}

/// GET /api/v1/users/:id
pub async fn get(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<User> {
    user.require(ADMINS)?;
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.users().get_404(id).await?.into()))
}

/// POST /api/v1/users
pub async fn create(State(state): State<AppState>, user: CurrentUser, Body(payload): Body<UserPayload>) -> ApiResult<User> {
    user.require(ADMINS)?;
    let role = payload.validate(false, true)?;
    let password = payload.password.clone().unwrap_or_default();
    let hash = hash_password_blocking(password, state.config.security.bcrypt_cost).await?;

    let created = state.users().insert(&payload.into_record(role, hash)).await?;
    info!(user_id = %created.id, admin_id = %user.0.id, "Admin created user");
    Ok(ApiResponse::created(created.into()))
}

/// PUT /api/v1/users/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Body(payload): Body<UserPayload>,
) -> ApiResult<User> {
    user.require(ADMINS)?;
    let id = parse_id(&id)?;
    let users = state.users();
    let existing = users.get_404(id).await?;

    let role = payload.validate(true, true)?;
    let hash = match payload.password.clone() {
        Some(password) => Some(hash_password_blocking(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };
    let changes = payload.into_changes(role, hash);
    if changes.is_empty() {
        return Ok(ApiResponse::success(existing.into()));
    }
    Ok(ApiResponse::success(users.update_by_id(id, changes).await?.into()))
}

/// DELETE /api/v1/users/:id - removes everything the identity owns.
pub async fn delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    user.require(ADMINS)?;
    let id = parse_id(&id)?;
    let users = state.users();
    users.get_404(id).await?;

    let owned = json!({ "user_id": id });
    let bootcamp_ids: Vec<Uuid> = state
        .bootcamps()
        .select_any(FilterData::matching(owned.clone()))
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();

    // Bootcamps elsewhere whose averages change once this user's content is gone.
    let mut touched: BTreeSet<Uuid> = BTreeSet::new();
    let courses: Vec<Course> = state.courses().select_any(FilterData::matching(owned.clone())).await?;
    let reviews: Vec<Review> = state.reviews().select_any(FilterData::matching(owned.clone())).await?;
    touched.extend(courses.iter().map(|c| c.bootcamp_id));
    touched.extend(reviews.iter().map(|r| r.bootcamp_id));

    if !bootcamp_ids.is_empty() {
        let children = json!({ "bootcamp_id": { "$in": &bootcamp_ids } });
        state.courses().delete_where(children.clone()).await?;
        state.reviews().delete_where(children).await?;
    }
    state.courses().delete_where(owned.clone()).await?;
    state.reviews().delete_where(owned.clone()).await?;
    state.bootcamps().delete_where(owned).await?;
    users.delete_by_id(id).await?;

    let removed: BTreeSet<Uuid> = bootcamp_ids.iter().copied().collect();
    for bootcamp_id in touched.difference(&removed) {
        refresh_bootcamp_averages(&state.store, *bootcamp_id).await?;
    }
    info!(user_id = %id, bootcamps = bootcamp_ids.len(), "Deleted user");

    Ok(ApiResponse::success(empty_data()))
}
