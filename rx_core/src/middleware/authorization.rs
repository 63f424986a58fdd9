//! Access control for the deep health endpoint

use std::sync::Arc;

use axum::{extract::Request, http::header::AUTHORIZATION};

use crate::config::HealthConfig;

pub type AuthorizationPredicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub enum Authorization {
    /// Every request is allowed.
    #[default]
    None,
    /// The `Authorization` header must equal this value exactly.
    Token(String),
    Custom(AuthorizationPredicate),
}

impl Authorization {
    pub fn from_config(config: &HealthConfig) -> Self {
        match &config.authorization_token {
            Some(token) => Authorization::Token(token.clone()),
            None => Authorization::None,
        }
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Authorization::Custom(Arc::new(predicate))
    }

    pub fn is_authorized(&self, request: &Request) -> bool {
        match self {
            Authorization::None => true,
            Authorization::Token(expected) => request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(|provided| provided == expected)
                .unwrap_or(false),
            Authorization::Custom(predicate) => predicate(request),
        }
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authorization::None => write!(f, "Authorization::None"),
            Authorization::Token(_) => write!(f, "Authorization::Token(<redacted>)"),
            Authorization::Custom(_) => write!(f, "Authorization::Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(value: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/deep");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_no_authorization_allows_everything() {
        let auth = Authorization::None;
        assert!(auth.is_authorized(&request_with_header(None)));
        assert!(auth.is_authorized(&request_with_header(Some("anything"))));
    }

    #[test]
    fn test_token_authorization() {
        let auth = Authorization::Token("123".to_string());
        assert!(auth.is_authorized(&request_with_header(Some("123"))));
        assert!(!auth.is_authorized(&request_with_header(Some("12"))));
        assert!(!auth.is_authorized(&request_with_header(None)));
    }

    #[test]
    fn test_custom_authorization() {
        let auth = Authorization::custom(|request| request.headers().contains_key("x-internal"));
        assert!(!auth.is_authorized(&request_with_header(None)));

        let request = http::Request::builder()
            .uri("/deep")
            .header("x-internal", "1")
            .body(Body::empty())
            .unwrap();
        assert!(auth.is_authorized(&request));
    }

    #[test]
    fn test_from_config() {
        let mut config = HealthConfig::default();
        assert!(matches!(Authorization::from_config(&config), Authorization::None));

        config.authorization_token = Some("secret".to_string());
        assert!(matches!(
            Authorization::from_config(&config),
            Authorization::Token(token) if token == "secret"
        ));
    }
}
