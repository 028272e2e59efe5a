// handlers/reviews.rs - /api/v1/reviews

use axum::{
    extract::{Path, RawQuery, State},
    response::Json,
};
use serde_json::Value;

use crate::auth::check_ownership;
use crate::database::models::{Review, ReviewPayload};
use crate::database::repository::encode;
use crate::database::{Document, BOOTCAMPS, REVIEWS};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Body, CurrentUser};
use crate::query::{advanced_results, AdvancedResults, Populate, QueryParams};
use crate::services::refresh_bootcamp_averages;
use crate::state::AppState;

use super::bootcamps::REVIEWERS;
use super::{empty_data, parse_id, populate_one};

pub const REVIEW_POPULATE: &[Populate] = &[Populate::Reference {
    local_field: "bootcamp_id",
    target: &BOOTCAMPS,
    as_field: "bootcamp",
    select: &["name", "description"],
}];

/// GET /api/v1/reviews
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<AdvancedResults>, ApiError> {
    let params = QueryParams::parse(query.as_deref());
    let results = advanced_results(state.store.as_ref(), &REVIEWS, &params, REVIEW_POPULATE, &state.config.filter).await?;
    Ok(Json(results))
}

/// GET /api/v1/reviews/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Document> {
    let id = parse_id(&id)?;
    let review = state.reviews().get_404(id).await?;
    let doc = populate_one(state.store.as_ref(), encode(&review)?, REVIEW_POPULATE).await?;
    Ok(ApiResponse::success(doc))
}

/// PUT /api/v1/reviews/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Body(payload): Body<ReviewPayload>,
) -> ApiResult<Review> {
    user.require(REVIEWERS)?;
    let id = parse_id(&id)?;
    let reviews = state.reviews();
    let review = reviews.get_404(id).await?;
    check_ownership(review.user_id, &user.identity())?;

    payload.validate(true)?;
    let changes = payload.into_changes();
    if changes.is_empty() {
        return Ok(ApiResponse::success(review));
    }
    let updated = reviews.update_by_id(id, changes).await?;
    refresh_bootcamp_averages(&state.store, updated.bootcamp_id).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/reviews/:id
pub async fn delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    user.require(REVIEWERS)?;
    let id = parse_id(&id)?;
    let reviews = state.reviews();
    let review = reviews.get_404(id).await?;
    check_ownership(review.user_id, &user.identity())?;

    reviews.delete_by_id(id).await?;
    refresh_bootcamp_averages(&state.store, review.bootcamp_id).await?;
    Ok(ApiResponse::success(empty_data()))
}
