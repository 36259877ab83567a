use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method},
    routing::get,
    BoxError, Router,
};
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    ServiceBuilder,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{system, users};
use crate::state::AppState;

/// Build the application router. The request timeout lives here, at the
/// HTTP boundary, rather than inside the guard.
pub fn router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Guarded member resources
        .merge(user_routes())
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(users::profile_get))
        .route("/api/users/:user_id", get(users::profile_get))
        .route("/api/users/:user_id/posts", get(users::posts_get))
        .route("/api/users/:user_id/certificates", get(users::certificates_get))
        .route("/api/users/:user_id/degrees", get(users::degrees_get))
        .route("/api/users/:user_id/gallery", get(users::gallery_get))
        .route("/api/users/:user_id/drafts", get(users::drafts_get))
}

/// Turn middleware errors into the standard JSON error body
async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the configured timeout");
        ApiError::request_timeout("Request timed out")
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        ApiError::internal_server_error("Internal server error")
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    // Credentials are allowed so the browser sends the session cookie
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
