use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{Credential, IdentityProvider, ProviderError};

/// Subset of the auth service's user payload we care about
#[derive(Debug, Deserialize)]
struct RemoteUser {
    #[serde(default)]
    id: String,
}

/// Live verification against the hosted auth service (`GET /auth/v1/user`).
///
/// Every call hits the provider, so a revoked session is rejected even when
/// its token has not expired yet.
pub struct AuthServiceProvider {
    client: reqwest::Client,
    user_endpoint: Url,
    anon_key: String,
}

impl AuthServiceProvider {
    pub fn new(base_url: &str, anon_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let user_endpoint = Url::parse(&base)
            .and_then(|url| url.join("auth/v1/user"))
            .map_err(|e| ProviderError::Configuration(format!("invalid auth url '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            user_endpoint,
            anon_key,
        })
    }

    pub fn user_endpoint(&self) -> &Url {
        &self.user_endpoint
    }
}

#[async_trait]
impl IdentityProvider for AuthServiceProvider {
    fn name(&self) -> &'static str {
        "auth-service"
    }

    async fn verify(&self, credential: &Credential) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .get(self.user_endpoint.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(credential.token())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: RemoteUser = response.json().await?;
                Ok(Some(user.id).filter(|id| !id.is_empty()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(ProviderError::Service(format!(
                "auth service returned {} for {}",
                status, self.user_endpoint
            ))),
        }
    }
}
