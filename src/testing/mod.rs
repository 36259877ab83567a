//! In-memory identity provider and store with call counters, for tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::identity::{Credential, IdentityProvider, ProviderError};
use crate::store::{ProfileStore, Resource, ResourceStore, StoreError};

/// Resolves tokens from a fixed table
#[derive(Default)]
pub struct MockIdentityProvider {
    tokens: HashMap<String, String>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: &str) -> Self {
        self.tokens.insert(token.to_string(), identity.to_string());
        self
    }

    /// Every call fails as if the provider were down
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn verify(&self, credential: &Credential) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ProviderError::Service("provider unavailable".to_string()));
        }
        Ok(self.tokens.get(credential.token()).cloned())
    }
}

/// Profiles and owned rows held in memory
#[derive(Default)]
pub struct MemoryStore {
    profiles: HashMap<String, Value>,
    rows: Vec<(Resource, Value)>,
    failure: Option<String>,
    delay: Option<Duration>,
    profile_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, id: &str) -> Self {
        self.with_profile_row(id, json!({ "id": id }))
    }

    pub fn with_profile_row(mut self, id: &str, row: Value) -> Self {
        self.profiles.insert(id.to_string(), row);
        self
    }

    /// `row` must carry the resource's owner column
    pub fn with_row(mut self, resource: Resource, row: Value) -> Self {
        self.rows.push((resource, row));
        self
    }

    /// Every query fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Profile lookups stall for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn profile_lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(message) => Err(StoreError::QueryError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile_key(&self, identity: &str) -> Result<Option<String>, StoreError> {
        self.profile_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(self.profiles.get(identity).map(|_| identity.to_string()))
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn fetch_profile(&self, identity: &str) -> Result<Option<Value>, StoreError> {
        self.check()?;
        Ok(self.profiles.get(identity).cloned())
    }

    async fn list_owned(&self, resource: Resource, owner: &str) -> Result<Vec<Value>, StoreError> {
        self.check()?;
        let mut rows: Vec<Value> = self
            .rows
            .iter()
            .filter(|(r, row)| *r == resource && row[resource.owner_column()].as_str() == Some(owner))
            .map(|(_, row)| row.clone())
            .collect();

        // Newest first, matching the SQL ordering
        let order = resource.order_column();
        rows.sort_by(|a, b| b[order].as_str().cmp(&a[order].as_str()));
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }
}
