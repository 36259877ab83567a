//! Identity resolution and access guard.
//!
//! Every member resource runs the same linear check before touching its own
//! data:
//!
//! ```text
//! Start -> ParamExtracted -> IdentityResolved -> ProfileVerified -> Authorized
//!              |                   |                   |
//!          BadRequest         Unauthorized      NotFound | Upstream
//! ```
//!
//! Local checks run before the identity provider is called, and the provider
//! before the profile store. Nothing is cached or retried here.

pub mod credential;
pub mod params;

use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::identity::IdentityProvider;
use crate::store::ProfileStore;

pub use credential::{extract_credential, CredentialSource};
pub use params::{extract_identity_parameter, GuardRequest};

/// Parameter value meaning "the authenticated caller"
pub const SENTINEL_ME: &str = "me";

/// Terminal failure of a guarded request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardRejection {
    /// Missing or malformed identity parameter
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired credential on the "me" path
    #[error("{0}")]
    Unauthorized(String),

    /// Well-formed identity with no backing profile
    #[error("{0}")]
    NotFound(String),

    /// The profile store itself failed. Safe for the caller to retry.
    #[error("{0}")]
    Upstream(String),
}

impl GuardRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuardRejection::BadRequest(_) => StatusCode::BAD_REQUEST,
            GuardRejection::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GuardRejection::NotFound(_) => StatusCode::NOT_FOUND,
            GuardRejection::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map to the HTTP error. Upstream messages are opaque and only reach the
    /// client when `expose_upstream` is set.
    pub fn into_api_error(self, expose_upstream: bool) -> ApiError {
        match self {
            GuardRejection::BadRequest(msg) => ApiError::bad_request(msg),
            GuardRejection::Unauthorized(msg) => ApiError::unauthorized(msg),
            GuardRejection::NotFound(msg) => ApiError::not_found(msg),
            GuardRejection::Upstream(msg) => ApiError::upstream(&msg, expose_upstream),
        }
    }
}

/// How the concrete identity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The parameter was the id itself
    Direct,
    /// The parameter was "me" and the provider vouched for the caller
    Sentinel,
}

/// Identity produced for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    pub id: String,
    pub resolution: Resolution,
}

pub type GuardOutcome = Result<ResolvedIdentity, GuardRejection>;

/// Shared guard, built once at startup and handed to every handler
#[derive(Clone)]
pub struct IdentityGuard {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    credentials: CredentialSource,
}

impl IdentityGuard {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        credentials: CredentialSource,
    ) -> Self {
        Self {
            provider,
            profiles,
            credentials,
        }
    }

    /// Full check: parameter, identity, then profile existence
    pub async fn guard(&self, request: &GuardRequest) -> GuardOutcome {
        let parameter = request.identity_parameter();
        debug!(parameter = ?parameter, "Guard: parameter extracted");

        let identity = self.resolve_identity(parameter.as_deref(), &request.headers).await?;
        debug!(identity = %identity.id, resolution = ?identity.resolution, "Guard: identity resolved");

        self.verify_profile_exists(&identity.id).await?;
        debug!(identity = %identity.id, "Guard: authorized");

        Ok(identity)
    }

    /// Like [`guard`](Self::guard) but only the caller's own identity is
    /// accepted. A concrete id is refused before any network call.
    pub async fn guard_owner(&self, request: &GuardRequest) -> GuardOutcome {
        match request.identity_parameter().as_deref() {
            None => Err(GuardRejection::BadRequest("Missing user id".to_string())),
            Some(SENTINEL_ME) => self.guard(request).await,
            Some(other) => {
                debug!(parameter = %other, "Guard: owner-only resource requested by id");
                Err(GuardRejection::Unauthorized(
                    "This resource is only available to its owner".to_string(),
                ))
            }
        }
    }

    /// Turn the parameter into a concrete identity.
    ///
    /// Concrete ids pass through untouched with no credential check. The
    /// sentinel requires a credential the provider accepts; a provider fault
    /// is reported as `Unauthorized` since the caller cannot tell it apart
    /// from a bad token.
    pub async fn resolve_identity(&self, parameter: Option<&str>, headers: &HeaderMap) -> GuardOutcome {
        let parameter = match parameter.map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => return Err(GuardRejection::BadRequest("Missing user id".to_string())),
        };

        if parameter != SENTINEL_ME {
            return Ok(ResolvedIdentity {
                id: parameter.to_string(),
                resolution: Resolution::Direct,
            });
        }

        let credential = self.credentials.extract(headers).ok_or_else(|| {
            debug!("Guard: no credential supplied for 'me'");
            GuardRejection::Unauthorized("Authentication required".to_string())
        })?;

        match self.provider.verify(&credential).await {
            Ok(Some(id)) => Ok(ResolvedIdentity {
                id,
                resolution: Resolution::Sentinel,
            }),
            Ok(None) => {
                debug!(kind = credential.kind(), "Guard: credential resolved to no user");
                Err(GuardRejection::Unauthorized("Invalid or expired credential".to_string()))
            }
            Err(e) => {
                warn!(provider = self.provider.name(), "Identity verification failed: {}", e);
                Err(GuardRejection::Unauthorized("Invalid or expired credential".to_string()))
            }
        }
    }

    /// One key-only lookup against the profile store
    pub async fn verify_profile_exists(&self, identity: &str) -> Result<(), GuardRejection> {
        match self.profiles.find_profile_key(identity).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                debug!(identity = %identity, "Guard: no profile for identity");
                Err(GuardRejection::NotFound("Profile not found".to_string()))
            }
            Err(e) => Err(GuardRejection::Upstream(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, MockIdentityProvider};

    struct Harness {
        provider: Arc<MockIdentityProvider>,
        store: Arc<MemoryStore>,
        guard: IdentityGuard,
    }

    fn harness(provider: MockIdentityProvider, store: MemoryStore) -> Harness {
        let provider = Arc::new(provider);
        let store = Arc::new(store);
        let guard = IdentityGuard::new(provider.clone(), store.clone(), CredentialSource::bearer());
        Harness { provider, store, guard }
    }

    fn default_harness() -> Harness {
        harness(
            MockIdentityProvider::new().with_token("abc123", "u-9").with_token("tok-42", "42"),
            MemoryStore::new().with_profile("42"),
        )
    }

    #[tokio::test]
    async fn direct_id_with_profile_is_authorized() {
        let h = default_harness();
        let request = GuardRequest::default().with_path("user_id", "42");

        let identity = h.guard.guard(&request).await.unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.resolution, Resolution::Direct);
        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.store.profile_lookups(), 1);
    }

    #[tokio::test]
    async fn direct_id_ignores_credentials_entirely() {
        let h = default_harness();
        let request = GuardRequest::default()
            .with_path("user_id", "42")
            .with_header("authorization", "Bearer garbage");

        assert!(h.guard.guard(&request).await.is_ok());
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn empty_parameter_is_bad_request_without_network_calls() {
        let h = default_harness();
        for request in [
            GuardRequest::default(),
            GuardRequest::default().with_path("user_id", ""),
            GuardRequest::default().with_query("userId", ""),
            GuardRequest::default().with_path("user_id", "[user_id]"),
        ] {
            let err = h.guard.guard(&request).await.unwrap_err();
            assert!(matches!(err, GuardRejection::BadRequest(_)));
        }
        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.store.profile_lookups(), 0);
    }

    #[tokio::test]
    async fn me_without_credential_is_unauthorized() {
        let h = default_harness();
        let request = GuardRequest::default().with_path("user_id", "me");

        let err = h.guard.guard(&request).await.unwrap_err();
        assert!(matches!(err, GuardRejection::Unauthorized(_)));
        assert_eq!(h.store.profile_lookups(), 0);
    }

    #[tokio::test]
    async fn me_with_unknown_token_is_unauthorized() {
        let h = default_harness();
        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "Bearer nope");

        let err = h.guard.guard(&request).await.unwrap_err();
        assert!(matches!(err, GuardRejection::Unauthorized(_)));
        assert_eq!(h.provider.calls(), 1);
        assert_eq!(h.store.profile_lookups(), 0);
    }

    #[tokio::test]
    async fn me_resolves_through_provider() {
        let h = default_harness();
        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "tok-42");

        let identity = h.guard.guard(&request).await.unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.resolution, Resolution::Sentinel);
        assert_eq!(h.provider.calls(), 1);
        assert_eq!(h.store.profile_lookups(), 1);
    }

    #[tokio::test]
    async fn valid_credential_without_profile_is_not_found() {
        let h = default_harness();
        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "Bearer abc123");

        let err = h.guard.guard(&request).await.unwrap_err();
        assert_eq!(err, GuardRejection::NotFound("Profile not found".to_string()));
        assert_eq!(h.provider.calls(), 1);
        assert_eq!(h.store.profile_lookups(), 1);
    }

    #[tokio::test]
    async fn provider_fault_is_unauthorized_not_upstream() {
        let h = harness(MockIdentityProvider::new().failing(), MemoryStore::new().with_profile("u-9"));
        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "Bearer xyz");

        let err = h.guard.guard(&request).await.unwrap_err();
        assert!(matches!(err, GuardRejection::Unauthorized(_)));
        assert_eq!(h.store.profile_lookups(), 0);
    }

    #[tokio::test]
    async fn store_fault_is_upstream() {
        let h = harness(MockIdentityProvider::new(), MemoryStore::new().failing("connection reset"));
        let request = GuardRequest::default().with_path("user_id", "42");

        let err = h.guard.guard(&request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, GuardRejection::Upstream(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn identical_input_yields_identical_outcome() {
        let h = default_harness();
        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "Bearer abc123");

        let first = h.guard.guard(&request).await;
        let second = h.guard.guard(&request).await;
        assert_eq!(first, second);
        assert_eq!(h.provider.calls(), 2);
    }

    #[tokio::test]
    async fn owner_guard_refuses_concrete_ids_before_network() {
        let h = default_harness();
        let request = GuardRequest::default().with_path("user_id", "42");

        let err = h.guard.guard_owner(&request).await.unwrap_err();
        assert!(matches!(err, GuardRejection::Unauthorized(_)));
        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.store.profile_lookups(), 0);

        let request = GuardRequest::default()
            .with_path("user_id", "me")
            .with_header("authorization", "Bearer tok-42");
        assert_eq!(h.guard.guard_owner(&request).await.unwrap().id, "42");
    }

    #[test]
    fn rejections_map_to_statuses() {
        let cases = [
            (GuardRejection::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (GuardRejection::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (GuardRejection::NotFound("x".into()), StatusCode::NOT_FOUND),
            (GuardRejection::Upstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (rejection, status) in cases {
            assert_eq!(rejection.status_code(), status);
            assert_eq!(rejection.into_api_error(false).status_code(), status);
        }
    }
}
