use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - service descriptor
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Village-One API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "profile": "/api/users/:user_id, /api/profile?userId= (guarded)",
                "posts": "/api/users/:user_id/posts (guarded)",
                "certificates": "/api/users/:user_id/certificates (guarded)",
                "degrees": "/api/users/:user_id/degrees (guarded)",
                "gallery": "/api/users/:user_id/gallery (guarded)",
                "drafts": "/api/users/me/drafts (owner only)",
            },
            "identity": "use 'me' as :user_id to address the authenticated caller"
        }
    }))
}

/// GET /health - pings the store
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.resources.health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}
