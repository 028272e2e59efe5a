// handlers/bootcamps.rs - /api/v1/bootcamps, including the nested course
// and review collections of one bootcamp

use axum::{
    extract::{Path, RawQuery, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{check_ownership, Role};
use crate::database::models::{Bootcamp, BootcampPayload, Course, CoursePayload, Review, ReviewPayload};
use crate::database::{BOOTCAMPS, COURSES};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, Body, CurrentUser};
use crate::query::{advanced_results, AdvancedResults, Populate, QueryParams};
use crate::services::refresh_bootcamp_averages;
use crate::state::AppState;

use super::{empty_data, parse_id};

pub const PUBLISHERS: &[Role] = &[Role::Publisher, Role::Admin];
pub const REVIEWERS: &[Role] = &[Role::User, Role::Admin];

pub const BOOTCAMP_POPULATE: &[Populate] = &[Populate::Children {
    target: &COURSES,
    foreign_field: "bootcamp_id",
    as_field: "courses",
}];

/// GET /api/v1/bootcamps
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<AdvancedResults>, ApiError> {
    let params = QueryParams::parse(query.as_deref());
    let results = advanced_results(state.store.as_ref(), &BOOTCAMPS, &params, BOOTCAMP_POPULATE, &state.config.filter).await?;
    Ok(Json(results))
}

/// GET /api/v1/bootcamps/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Bootcamp> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.bootcamps().get_404(id).await?))
}

/// POST /api/v1/bootcamps - one bootcamp per publisher; admins are not limited.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Body(payload): Body<BootcampPayload>,
) -> ApiResult<Bootcamp> {
    user.require(PUBLISHERS)?;
    payload.validate(false)?;

    let bootcamps = state.bootcamps();
    let _publishing = if user.0.role != Role::Admin {
        let guard = state.publish_lock.lock().await;
        let published = bootcamps.count(Some(json!({ "user_id": user.0.id }))).await?;
        if published > 0 {
            return Err(ApiError::bad_request(format!(
                "The user with ID {} has already published a bootcamp",
                user.0.id
            )));
        }
        Some(guard)
    } else {
        None
    };

    let bootcamp = bootcamps.insert(&payload.into_bootcamp(user.0.id)).await?;
    info!(bootcamp_id = %bootcamp.id, user_id = %user.0.id, "Created bootcamp");
    Ok(ApiResponse::created(bootcamp))
}

/// PUT /api/v1/bootcamps/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Body(payload): Body<BootcampPayload>,
) -> ApiResult<Bootcamp> {
    user.require(PUBLISHERS)?;
    let id = parse_id(&id)?;
    let bootcamps = state.bootcamps();
    let bootcamp = bootcamps.get_404(id).await?;
    check_ownership(bootcamp.user_id, &user.identity())?;

    payload.validate(true)?;
    let changes = payload.into_changes();
    if changes.is_empty() {
        return Ok(ApiResponse::success(bootcamp));
    }
    Ok(ApiResponse::success(bootcamps.update_by_id(id, changes).await?))
}

/// DELETE /api/v1/bootcamps/:id - removes the bootcamp's courses and reviews too.
pub async fn delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> ApiResult<Value> {
    user.require(PUBLISHERS)?;
    let id = parse_id(&id)?;
    let bootcamps = state.bootcamps();
    let bootcamp = bootcamps.get_404(id).await?;
    check_ownership(bootcamp.user_id, &user.identity())?;

    let children = json!({ "bootcamp_id": id });
    let courses = state.courses().delete_where(children.clone()).await?;
    let reviews = state.reviews().delete_where(children).await?;
    bootcamps.delete_by_id(id).await?;
    info!(bootcamp_id = %id, courses, reviews, "Deleted bootcamp");

    Ok(ApiResponse::success(empty_data()))
}

fn by_bootcamp(bootcamp_id: uuid::Uuid) -> FilterData {
    FilterData {
        where_clause: Some(json!({ "bootcamp_id": bootcamp_id })),
        order: Some(json!(["created_at asc", "id asc"])),
        ..Default::default()
    }
}

/// GET /api/v1/bootcamps/:id/courses
pub async fn list_courses(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Course>> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::list(state.courses().select_any(by_bootcamp(id)).await?))
}

/// POST /api/v1/bootcamps/:id/courses - only the bootcamp's owner adds courses.
pub async fn add_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Body(payload): Body<CoursePayload>,
) -> ApiResult<Course> {
    user.require(PUBLISHERS)?;
    let id = parse_id(&id)?;
    let bootcamp = state.bootcamps().get_404(id).await?;
    check_ownership(bootcamp.user_id, &user.identity())?;

    let skill = payload
        .validate(false)?
        .ok_or_else(|| ApiError::validation_error("Please add a minimum skill", None))?;
    let course = state.courses().insert(&payload.into_course(skill, id, user.0.id)).await?;
    refresh_bootcamp_averages(&state.store, id).await?;

    Ok(ApiResponse::created(course))
}

/// GET /api/v1/bootcamps/:id/reviews
pub async fn list_reviews(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Review>> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::list(state.reviews().select_any(by_bootcamp(id)).await?))
}

/// POST /api/v1/bootcamps/:id/reviews - one review per user and bootcamp.
pub async fn add_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Body(payload): Body<ReviewPayload>,
) -> ApiResult<Review> {
    user.require(REVIEWERS)?;
    let id = parse_id(&id)?;
    state.bootcamps().get_404(id).await?;

    payload.validate(false)?;
    let review = state.reviews().insert(&payload.into_review(id, user.0.id)).await?;
    refresh_bootcamp_averages(&state.store, id).await?;

    Ok(ApiResponse::created(review))
}
