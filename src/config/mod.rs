use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Upper bound for a whole request, enforced at the HTTP boundary
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Which identity-verification capability backs the "me" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMode {
    /// Verify provider-signed access tokens locally
    Jwt,
    /// Ask the hosted auth service on every request
    Remote,
}

/// Where the caller's credential is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStyle {
    Bearer,
    Session,
    Either,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub credential_style: CredentialStyle,
    pub session_cookie: String,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub auth_url: Option<String>,
    pub anon_key: Option<String>,
    pub auth_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// Show raw upstream messages in 500 bodies (never in production)
    pub expose_upstream_errors: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("VILLAGE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_MODE") {
            match v.as_str() {
                "jwt" => self.identity.mode = IdentityMode::Jwt,
                "remote" => self.identity.mode = IdentityMode::Remote,
                other => tracing::warn!("Ignoring unknown IDENTITY_MODE '{}'", other),
            }
        }
        if let Ok(v) = env::var("CREDENTIAL_SOURCE") {
            match v.as_str() {
                "bearer" => self.identity.credential_style = CredentialStyle::Bearer,
                "session" => self.identity.credential_style = CredentialStyle::Session,
                "either" => self.identity.credential_style = CredentialStyle::Either,
                other => tracing::warn!("Ignoring unknown CREDENTIAL_SOURCE '{}'", other),
            }
        }
        if let Ok(v) = env::var("SESSION_COOKIE") {
            self.identity.session_cookie = v;
        }
        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            self.identity.jwt_secret = v;
        }
        if let Ok(v) = env::var("AUTH_JWT_AUDIENCE") {
            self.identity.jwt_audience = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("AUTH_URL") {
            self.identity.auth_url = Some(v);
        }
        if let Ok(v) = env::var("AUTH_ANON_KEY") {
            self.identity.anon_key = Some(v);
        }
        if let Ok(v) = env::var("AUTH_TIMEOUT_SECS") {
            self.identity.auth_timeout_secs = v.parse().unwrap_or(self.identity.auth_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_EXPOSE_UPSTREAM_ERRORS") {
            self.security.expose_upstream_errors = v.parse().unwrap_or(self.security.expose_upstream_errors);
        }

        self
    }

    /// Reject combinations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.identity.mode {
            IdentityMode::Jwt => {
                if self.identity.jwt_secret.is_empty() {
                    return Err(ConfigError::Missing("AUTH_JWT_SECRET"));
                }
            }
            IdentityMode::Remote => {
                let url = self.identity.auth_url.as_deref().ok_or(ConfigError::Missing("AUTH_URL"))?;
                url::Url::parse(url).map_err(|_| ConfigError::Invalid {
                    name: "AUTH_URL",
                    value: url.to_string(),
                })?;
                if self.identity.anon_key.as_deref().unwrap_or("").is_empty() {
                    return Err(ConfigError::Missing("AUTH_ANON_KEY"));
                }
            }
        }

        if self.identity.session_cookie.is_empty() && self.identity.credential_style != CredentialStyle::Bearer {
            return Err(ConfigError::Missing("SESSION_COOKIE"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Jwt,
                credential_style: CredentialStyle::Either,
                session_cookie: "sb-access-token".to_string(),
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                auth_url: None,
                anon_key: None,
                auth_timeout_secs: 10,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                expose_upstream_errors: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                request_timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Remote,
                credential_style: CredentialStyle::Either,
                session_cookie: "sb-access-token".to_string(),
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                auth_url: None,
                anon_key: None,
                auth_timeout_secs: 5,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.village-one.org".to_string()],
                expose_upstream_errors: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Remote,
                credential_style: CredentialStyle::Bearer,
                session_cookie: "sb-access-token".to_string(),
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                auth_url: None,
                anon_key: None,
                auth_timeout_secs: 5,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://village-one.org".to_string()],
                expose_upstream_errors: false,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.identity.mode, IdentityMode::Jwt);
        assert_eq!(config.identity.credential_style, CredentialStyle::Either);
        assert!(config.security.expose_upstream_errors);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.identity.mode, IdentityMode::Remote);
        assert!(!config.security.expose_upstream_errors);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn jwt_mode_requires_secret() {
        let mut config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("AUTH_JWT_SECRET"))));

        config.identity.jwt_secret = "dev-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn remote_mode_requires_url_and_key() {
        let mut config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("AUTH_URL"))));

        config.identity.auth_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { name: "AUTH_URL", .. })));

        config.identity.auth_url = Some("https://project.supabase.co".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("AUTH_ANON_KEY"))));

        config.identity.anon_key = Some("anon".to_string());
        assert!(config.validate().is_ok());
    }
}
