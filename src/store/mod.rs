//! Profile and member-resource storage.

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use postgres::PgStore;

/// Errors from the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Existence lookups against the profile table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profile's key column only, or `None` when no row matches
    async fn find_profile_key(&self, identity: &str) -> Result<Option<String>, StoreError>;
}

/// Member-owned collections served behind the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Posts,
    Certificates,
    Degrees,
    Gallery,
    Drafts,
}

impl Resource {
    pub fn table(&self) -> &'static str {
        match self {
            Resource::Posts => "posts",
            Resource::Certificates => "certificates",
            Resource::Degrees => "degrees",
            Resource::Gallery => "gallery",
            Resource::Drafts => "drafts",
        }
    }

    /// Column holding the owning profile id
    pub fn owner_column(&self) -> &'static str {
        match self {
            Resource::Posts | Resource::Drafts => "author_id",
            Resource::Certificates | Resource::Degrees | Resource::Gallery => "user_id",
        }
    }

    pub fn order_column(&self) -> &'static str {
        match self {
            Resource::Drafts => "updated_at",
            _ => "created_at",
        }
    }
}

/// Queries the resource handlers run once the guard has produced an identity
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn fetch_profile(&self, identity: &str) -> Result<Option<Value>, StoreError>;

    /// Rows of `resource` owned by `owner`, newest first
    async fn list_owned(&self, resource: Resource, owner: &str) -> Result<Vec<Value>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
