use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use village_one_api::{
    app,
    config::AppConfig,
    state::AppState,
    testing::{MemoryStore, MockIdentityProvider},
};

/// Router wired to in-memory dependencies, plus handles for call counting
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockIdentityProvider>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new(provider: MockIdentityProvider, store: MemoryStore) -> Self {
        Self::with_config(AppConfig::default(), provider, store)
    }

    pub fn with_config(config: AppConfig, provider: MockIdentityProvider, store: MemoryStore) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(store);
        let state = AppState::new(config, provider.clone(), store.clone(), store.clone());

        Self {
            router: app::router(state),
            provider,
            store,
        }
    }

    /// GET `uri`, optionally with extra headers, and decode the JSON body
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("request");

        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };

        (status, body)
    }
}
