//! API-key authentication and caller identity.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{Caller, Role};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Bearer key required on every request, when set
    pub api_key: Option<String>,
}

impl SecurityConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
        }
    }

    /// No authentication (local development and tests).
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }
}

/// Reject requests without the configured bearer key.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &config.api_key else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == expected_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing or malformed Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Read the caller's identity from the headers set by the identity provider.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, (StatusCode, String)> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            format!("Missing {} header", USER_ID_HEADER),
        ))?
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            format!("Malformed {} header", USER_ID_HEADER),
        ))?;

    let role = match headers.get(USER_ROLE_HEADER) {
        None => Role::User,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| Role::from_str(v.trim()))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                format!("Unknown {} header", USER_ROLE_HEADER),
            ))?,
    };

    Ok(Caller { user_id, role })
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).inspect_err(|(_, msg)| {
            tracing::warn!("Rejected caller identity: {}", msg);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn missing_user_id_is_unauthorized() {
        let err = caller_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn malformed_user_id_is_unauthorized() {
        let err = caller_from_headers(&headers(&[(USER_ID_HEADER, "bob")])).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn role_defaults_to_user() {
        let id = Uuid::new_v4();
        let caller = caller_from_headers(&headers(&[(USER_ID_HEADER, &id.to_string())])).unwrap();
        assert_eq!(caller, Caller::user(id));
    }

    #[test]
    fn admin_role_is_read() {
        let id = Uuid::new_v4();
        let caller = caller_from_headers(&headers(&[
            (USER_ID_HEADER, &id.to_string()),
            (USER_ROLE_HEADER, "admin"),
        ]))
        .unwrap();
        assert_eq!(caller.role, Role::Admin);
    }

    #[test]
    fn security_config_with_api_key_has_auth() {
        let config = SecurityConfig::with_api_key("test-key");
        assert_eq!(config.api_key, Some("test-key".to_string()));
        assert!(SecurityConfig::disabled().api_key.is_none());
    }
}
