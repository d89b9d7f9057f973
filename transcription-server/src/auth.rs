use crate::environ::AuthConfig;
use crate::error::HttpError;
use axum::http::HeaderMap;
use tracing::warn;

const API_KEY_HEADER: &str = "x-api-key";
const AUTHORIZATION_HEADER: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// Verifies the shared-secret token against `X-API-Key` or `Authorization: Bearer`.
///
/// When `API_TOKEN` is unset, auth is disabled and every call is allowed through, with a
/// warning on every call (backward-compatible with deployments that never configured a
/// token).
pub fn verify(headers: &HeaderMap, config: &AuthConfig) -> Result<(), HttpError> {
    if !config.enabled() {
        warn!("API_TOKEN not configured - allowing all requests");
        return Ok(());
    }

    if let Some(api_key) = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if api_key == config.api_token {
            return Ok(());
        }
    }

    if let Some(auth_header) = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) {
            if token.trim() == config.api_token {
                return Ok(());
            }
        }
    }

    warn!("Invalid or missing API token");
    Err(HttpError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(token: &str) -> AuthConfig {
        AuthConfig {
            api_token: token.to_string(),
        }
    }

    #[test]
    fn disabled_when_token_empty() {
        let headers = HeaderMap::new();
        assert!(verify(&headers, &config("")).is_ok());
    }

    #[test]
    fn accepts_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("secret"));
        assert!(verify(&headers, &config("secret")).is_ok());
    }

    #[test]
    fn accepts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION_HEADER,
            HeaderValue::from_static("Bearer secret"),
        );
        assert!(verify(&headers, &config("secret")).is_ok());
    }

    #[test]
    fn rejects_wrong_token() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("nope"));
        assert!(matches!(
            verify(&headers, &config("secret")),
            Err(HttpError::Unauthorized)
        ));
    }

    #[test]
    fn rejects_missing_token_when_enabled() {
        let headers = HeaderMap::new();
        assert!(matches!(
            verify(&headers, &config("secret")),
            Err(HttpError::Unauthorized)
        ));
    }
}
