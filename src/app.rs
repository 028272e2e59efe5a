use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health))
        .nest("/api/v1", api_routes())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router.with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/bootcamps", bootcamp_routes())
        .nest("/courses", course_routes())
        .nest("/reviews", review_routes())
        .nest("/users", user_routes())
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/me", get(auth::me))
        .route("/updatedetails", put(auth::update_details))
        .route("/updatepassword", put(auth::update_password))
        .route("/forgetpassword", post(auth::forgot_password))
        .route("/resetpassword/:resettoken", put(auth::reset_password))
}

fn bootcamp_routes() -> Router<AppState> {
    use handlers::bootcamps;

    Router::new()
        .route("/", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/:id",
            get(bootcamps::get).put(bootcamps::update).delete(bootcamps::delete),
        )
        // Nested collections of one bootcamp
        .route("/:id/courses", get(bootcamps::list_courses).post(bootcamps::add_course))
        .route("/:id/reviews", get(bootcamps::list_reviews).post(bootcamps::add_review))
}

fn course_routes() -> Router<AppState> {
    use handlers::courses;

    Router::new()
        .route("/", get(courses::list))
        .route("/:id", get(courses::get).put(courses::update).delete(courses::delete))
}

fn review_routes() -> Router<AppState> {
    use handlers::reviews;

    Router::new()
        .route("/", get(reviews::list))
        .route("/:id", get(reviews::get).put(reviews::update).delete(reviews::delete))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/:id", get(users::get).put(users::update).delete(users::delete))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryStore;
    use crate::services::LogMailer;

    fn test_app() -> Router {
        let state = AppState::new(AppConfig::test(), Arc::new(MemoryStore::new()), Arc::new(LogMailer)).unwrap();
        app(state)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn public_and_protected_routes() {
        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();
        assert_eq!(status_of(get("/health")).await, StatusCode::OK);
        assert_eq!(status_of(get("/api/v1/bootcamps")).await, StatusCode::OK);
        assert_eq!(status_of(get("/api/v1/users")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(get("/api/v1/unknown")).await, StatusCode::NOT_FOUND);

        let create = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/bootcamps")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        assert_eq!(status_of(create).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cors_follows_configuration() {
        let mut security = AppConfig::test().security;
        assert!(cors_layer(&security).is_none());
        security.enable_cors = true;
        security.cors_origins = vec!["https://bootcamps.example.com".to_string()];
        assert!(cors_layer(&security).is_some());
    }
}
