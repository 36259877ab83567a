use std::sync::Arc;

use crate::config::AppConfig;
use crate::guard::{CredentialSource, IdentityGuard};
use crate::identity::{self, IdentityProvider};
use crate::store::{PgStore, ProfileStore, ResourceStore};

/// Process-wide dependencies, constructed once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub guard: IdentityGuard,
    pub resources: Arc<dyn ResourceStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        resources: Arc<dyn ResourceStore>,
    ) -> Self {
        let credentials = CredentialSource::from_config(&config.identity);

        Self {
            guard: IdentityGuard::new(provider, profiles, credentials),
            resources,
            config: Arc::new(config),
        }
    }

    /// Validate config, build the configured identity provider and open the
    /// database pool
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let provider = identity::from_config(&config.identity)?;
        tracing::info!("Identity provider: {}", provider.name());

        let store = Arc::new(PgStore::connect(&config.database).await?);

        Ok(Self::new(config, provider, store.clone(), store))
    }

    pub fn expose_upstream_errors(&self) -> bool {
        self.config.security.expose_upstream_errors
    }
}
