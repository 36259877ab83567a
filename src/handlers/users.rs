use axum::extract::State;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, GuardedIdentity, OwnerIdentity};
use crate::state::AppState;
use crate::store::{Resource, StoreError};

fn store_failure(state: &AppState, err: StoreError) -> ApiError {
    ApiError::upstream(&err.to_string(), state.expose_upstream_errors())
}

async fn list_owned(state: &AppState, resource: Resource, owner: &str) -> ApiResult<Vec<Value>> {
    let rows = state
        .resources
        .list_owned(resource, owner)
        .await
        .map_err(|e| store_failure(state, e))?;

    tracing::debug!("Listed {} {} for {}", rows.len(), resource.table(), owner);
    Ok(ApiResponse::success(rows))
}

/// GET /api/users/:user_id and GET /api/profile?userId= - full profile row
pub async fn profile_get(
    State(state): State<AppState>,
    GuardedIdentity(identity): GuardedIdentity,
) -> ApiResult<Value> {
    // The row can disappear between the guard's check and this read
    let profile = state
        .resources
        .fetch_profile(&identity.id)
        .await
        .map_err(|e| store_failure(&state, e))?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(ApiResponse::success(profile))
}

/// GET /api/users/:user_id/posts - forum posts authored by the user
pub async fn posts_get(
    State(state): State<AppState>,
    GuardedIdentity(identity): GuardedIdentity,
) -> ApiResult<Vec<Value>> {
    list_owned(&state, Resource::Posts, &identity.id).await
}

/// GET /api/users/:user_id/certificates
pub async fn certificates_get(
    State(state): State<AppState>,
    GuardedIdentity(identity): GuardedIdentity,
) -> ApiResult<Vec<Value>> {
    list_owned(&state, Resource::Certificates, &identity.id).await
}

/// GET /api/users/:user_id/degrees
pub async fn degrees_get(
    State(state): State<AppState>,
    GuardedIdentity(identity): GuardedIdentity,
) -> ApiResult<Vec<Value>> {
    list_owned(&state, Resource::Degrees, &identity.id).await
}

/// GET /api/users/:user_id/gallery
pub async fn gallery_get(
    State(state): State<AppState>,
    GuardedIdentity(identity): GuardedIdentity,
) -> ApiResult<Vec<Value>> {
    list_owned(&state, Resource::Gallery, &identity.id).await
}

/// GET /api/users/me/drafts - unpublished posts, visible to their author only
pub async fn drafts_get(
    State(state): State<AppState>,
    OwnerIdentity(identity): OwnerIdentity,
) -> ApiResult<Vec<Value>> {
    list_owned(&state, Resource::Drafts, &identity.id).await
}
