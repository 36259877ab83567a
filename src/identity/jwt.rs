use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Credential, IdentityProvider, ProviderError};

/// Access-token claims issued by the auth provider. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, audience: Option<&str>, expiry_hours: i64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours)).timestamp();

        Self {
            sub: sub.into(),
            aud: audience.map(str::to_string),
            email: None,
            role: Some("authenticated".to_string()),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Sign claims with the shared HS256 secret
pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Stateless verification of provider-signed access tokens
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, audience: Option<&str>) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate signature and expiry, returning the claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, ProviderError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ProviderError::InvalidCredential(format!("Invalid JWT token: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn verify(&self, credential: &Credential) -> Result<Option<String>, ProviderError> {
        let claims = self.decode_claims(credential.token())?;

        if claims.sub.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(claims.sub))
    }
}
