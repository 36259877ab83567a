//! Identity-verification capability.
//!
//! Turns a caller credential into a concrete user identity. Two
//! implementations exist and are selected by deployment context:
//! [`JwtIdentityProvider`] verifies provider-signed access tokens locally,
//! [`AuthServiceProvider`] asks the hosted auth service on every call.

pub mod jwt;
pub mod remote;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{IdentityConfig, IdentityMode};

pub use jwt::{Claims, JwtError, JwtIdentityProvider};
pub use remote::AuthServiceProvider;

/// Errors from an identity provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Identity service error: {0}")]
    Service(String),

    #[error("Identity provider misconfigured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// An opaque caller credential, tagged with where it was found
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization` header value
    Bearer(String),
    /// Session cookie carried by the browser
    Session(String),
}

impl Credential {
    pub fn token(&self) -> &str {
        match self {
            Credential::Bearer(token) | Credential::Session(token) => token,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Bearer(_) => "bearer",
            Credential::Session(_) => "session",
        }
    }
}

// Tokens stay out of logs
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential::{}(<redacted>)", self.kind())
    }
}

/// Resolves a credential to the identity it belongs to.
///
/// `Ok(None)` means the provider answered but recognised nobody.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    async fn verify(&self, credential: &Credential) -> Result<Option<String>, ProviderError>;
}

/// Build the provider named by configuration
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>, ProviderError> {
    match config.mode {
        IdentityMode::Jwt => {
            let provider = JwtIdentityProvider::new(&config.jwt_secret, config.jwt_audience.as_deref())
                .map_err(|e| ProviderError::Configuration(e.to_string()))?;
            Ok(Arc::new(provider))
        }
        IdentityMode::Remote => {
            let url = config
                .auth_url
                .as_deref()
                .ok_or_else(|| ProviderError::Configuration("AUTH_URL is not set".to_string()))?;
            let anon_key = config.anon_key.clone().unwrap_or_default();
            let provider = AuthServiceProvider::new(
                url,
                anon_key,
                std::time::Duration::from_secs(config.auth_timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
    }
}
