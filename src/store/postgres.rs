use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{ProfileStore, Resource, ResourceStore, StoreError};
use crate::config::DatabaseConfig;

const PROFILE_TABLE: &str = "profiles";

/// Postgres-backed profile and resource store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool once at process start
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }
}

/// Key-only existence query; ids are compared as text so any key type works
fn profile_key_sql() -> String {
    format!(
        "SELECT id::text AS id FROM \"{}\" WHERE id::text = $1 LIMIT 1",
        PROFILE_TABLE
    )
}

fn profile_row_sql() -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE id::text = $1) t",
        PROFILE_TABLE
    )
}

/// Table and column names come from `Resource`, never from the request
fn list_owned_sql(resource: Resource) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE \"{}\"::text = $1 ORDER BY \"{}\" DESC) t",
        resource.table(),
        resource.owner_column(),
        resource.order_column()
    )
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile_key(&self, identity: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(&profile_key_sql())
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("id"))
            .transpose()
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn fetch_profile(&self, identity: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(&profile_row_sql())
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<Value, _>("row"))
            .transpose()
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn list_owned(&self, resource: Resource, owner: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(&list_owned_sql(resource))
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| r.try_get::<Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
