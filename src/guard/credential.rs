use axum::http::{header, HeaderMap};

use crate::config::{CredentialStyle, IdentityConfig};
use crate::identity::Credential;

/// Where to look for the caller's credential
#[derive(Debug, Clone)]
pub struct CredentialSource {
    style: CredentialStyle,
    cookie_name: String,
}

impl CredentialSource {
    pub fn new(style: CredentialStyle, cookie_name: impl Into<String>) -> Self {
        Self {
            style,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn bearer() -> Self {
        Self::new(CredentialStyle::Bearer, String::new())
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.credential_style, config.session_cookie.clone())
    }

    pub fn extract(&self, headers: &HeaderMap) -> Option<Credential> {
        match self.style {
            CredentialStyle::Bearer => extract_credential(headers).map(Credential::Bearer),
            CredentialStyle::Session => extract_session(headers, &self.cookie_name).map(Credential::Session),
            CredentialStyle::Either => extract_credential(headers)
                .map(Credential::Bearer)
                .or_else(|| extract_session(headers, &self.cookie_name).map(Credential::Session)),
        }
    }
}

/// Token from the `Authorization` header. The `Bearer` scheme is matched
/// case-insensitively and is optional: a bare value is taken as the token
/// itself. A scheme with nothing after it is no credential at all.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();

    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Token from the named session cookie
pub fn extract_session(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if cookie_name.is_empty() {
        return None;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
