// handlers/root.rs - service info and health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Bootcamp API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Bootcamp directory backend API built with Rust (Axum)",
            "endpoints": {
                "auth": "/api/v1/auth/* (register, login, logout, me, password reset)",
                "bootcamps": "/api/v1/bootcamps[/:id[/courses|/reviews]]",
                "courses": "/api/v1/courses[/:id]",
                "reviews": "/api/v1/reviews[/:id]",
                "users": "/api/v1/users[/:id] (admin)",
            }
        }
    }))
}

/// GET /health - pings the store.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
