use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::guard::{GuardRequest, ResolvedIdentity};
use crate::state::AppState;

/// Identity that passed the guard. Use as a handler argument; the request is
/// rejected with 400/401/404/500 before the handler runs otherwise.
#[derive(Clone, Debug)]
pub struct GuardedIdentity(pub ResolvedIdentity);

/// Like [`GuardedIdentity`] but only the authenticated caller themselves
/// ("me") is accepted.
#[derive(Clone, Debug)]
pub struct OwnerIdentity(pub ResolvedIdentity);

async fn guard_request(parts: &mut Parts, state: &AppState) -> GuardRequest {
    // Routes without captures have no path params; the query string still applies
    let path = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();

    GuardRequest::from_parts(parts, path)
}

#[async_trait]
impl FromRequestParts<AppState> for GuardedIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let request = guard_request(parts, state).await;

        state
            .guard
            .guard(&request)
            .await
            .map(GuardedIdentity)
            .map_err(|rejection| rejection.into_api_error(state.expose_upstream_errors()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OwnerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let request = guard_request(parts, state).await;

        state
            .guard
            .guard_owner(&request)
            .await
            .map(OwnerIdentity)
            .map_err(|rejection| rejection.into_api_error(state.expose_upstream_errors()))
    }
}
