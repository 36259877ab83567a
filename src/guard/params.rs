use axum::http::{request::Parts, HeaderMap, HeaderValue};
use std::collections::HashMap;

/// Route segment name carrying the identity parameter
pub const USER_ID_FIELD: &str = "user_id";

/// Query spellings accepted when the route has no segment
pub const USER_ID_QUERY_FIELDS: &[&str] = &["user_id", "userId"];

/// The slice of an inbound request the guard looks at
#[derive(Debug, Clone, Default)]
pub struct GuardRequest {
    pub path: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl GuardRequest {
    /// Capture query pairs and headers from request parts. Route captures
    /// are added by the extractor, which owns the matched path.
    pub fn from_parts(parts: &Parts, path: HashMap<String, String>) -> Self {
        let query = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            path,
            query,
            headers: parts.headers.clone(),
        }
    }

    pub fn with_path(mut self, name: &str, value: &str) -> Self {
        self.path.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse::<HeaderValue>() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Identity parameter from the route segment, else the query string
    pub fn identity_parameter(&self) -> Option<String> {
        extract_identity_parameter(USER_ID_FIELD, &self.path, &[])
            .or_else(|| {
                USER_ID_QUERY_FIELDS
                    .iter()
                    .find_map(|field| extract_identity_parameter(field, &HashMap::new(), &self.query))
            })
    }
}

/// Read a named route/query field.
///
/// Repeated query keys collapse to their first value. A value that merely
/// echoes the placeholder (`user_id`, `:user_id`, `[user_id]`, `{user_id}`)
/// comes from an unfilled route template and counts as absent, as do empty
/// values.
pub fn extract_identity_parameter(
    field: &str,
    path: &HashMap<String, String>,
    query: &[(String, String)],
) -> Option<String> {
    let raw = path.get(field).map(String::as_str).or_else(|| {
        query
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    })?;

    let value = raw.trim();
    if value.is_empty() || is_placeholder(field, value) {
        return None;
    }

    Some(value.to_string())
}

fn is_placeholder(field: &str, value: &str) -> bool {
    let inner = value
        .strip_prefix(':')
        .or_else(|| value.strip_prefix('[').and_then(|v| v.strip_suffix(']')))
        .or_else(|| value.strip_prefix('{').and_then(|v| v.strip_suffix('}')))
        .unwrap_or(value);

    inner == field
}
