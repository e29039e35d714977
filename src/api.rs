use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, REQUEST_TIMEOUT_SECS};
use crate::store::Store;

/// API failures, categorized by HTTP status the way the call sites need them.
/// Every variant renders as the message shown to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Your session has expired. Please sign in again.")]
    Unauthorized,

    #[error("Too many attempts. Please try again later.")]
    RateLimited,

    #[error("Server error. Please try again later.")]
    Server(u16),

    #[error("{0}")]
    Validation(String),

    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("Network error. Please check your connection and try again.")]
    Network(#[source] reqwest::Error),

    #[error("Failed to read the server response")]
    Decode(#[source] reqwest::Error),
}

/// Shared HTTP client: base URL from config, 60-second timeout, bearer token
/// injected from the store, global 401 handling.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    store: Store,
}

impl ApiClient {
    pub fn new(config: &Config, store: Store) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.http.get(self.url(path)))?;
        response.json().map_err(ApiError::Decode)
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.http.post(self.url(path)).json(body))?;
        response.json().map_err(ApiError::Decode)
    }

    pub fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.http.put(self.url(path)).json(body))?;
        response.json().map_err(ApiError::Decode)
    }

    fn execute(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let request = match self.store.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().map_err(ApiError::Network)?;
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        debug!(status, body = body.as_str(), "request failed");
        Err(error_for_status(status, &body, &self.store))
    }
}

/// Map an error status to an `ApiError`. A 401 clears the stored credentials
/// before anything else sees it.
pub fn error_for_status(status: u16, body: &str, store: &Store) -> ApiError {
    match status {
        401 => {
            if let Err(e) = store.clear_credentials() {
                warn!(error = %e, "failed to clear credentials after 401");
            }
            ApiError::Unauthorized
        }
        429 => ApiError::RateLimited,
        500..=599 => ApiError::Server(status),
        400 => match first_validation_message(body) {
            Some(message) => ApiError::Validation(message),
            None => ApiError::Status(status),
        },
        _ => ApiError::Status(status),
    }
}

/// Pull the first human-readable message out of a 400 payload. The backend
/// answers either `{ "message": ... }` or `{ "errors": [{ "msg": ... }] }`.
fn first_validation_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorItem {
        msg: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        errors: Option<Vec<ErrorItem>>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    if let Some(message) = parsed.message {
        return Some(message);
    }
    parsed
        .errors?
        .into_iter()
        .find_map(|item| item.msg)
}

/// Percent-encode one path segment (specializations like "Web Development"
/// appear in quiz URLs).
pub fn percent_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::store::keys;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_unauthorized_clears_credentials() {
        let (_dir, store) = temp_store();
        store.set_token("expired-token").unwrap();
        store.set(keys::USER_DATA, &User::default()).unwrap();

        let err = error_for_status(401, "", &store);

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(store.token().is_none());
        assert!(store.get_raw(keys::USER_DATA).unwrap().is_none());
    }

    #[test]
    fn test_status_categories() {
        let (_dir, store) = temp_store();
        assert!(matches!(error_for_status(429, "", &store), ApiError::RateLimited));
        assert!(matches!(error_for_status(500, "", &store), ApiError::Server(500)));
        assert!(matches!(error_for_status(503, "", &store), ApiError::Server(503)));
        assert!(matches!(error_for_status(404, "", &store), ApiError::Status(404)));
    }

    #[test]
    fn test_validation_message_from_message_field() {
        let (_dir, store) = temp_store();
        let err = error_for_status(400, r#"{"message":"Email already registered"}"#, &store);
        match err {
            ApiError::Validation(message) => assert_eq!(message, "Email already registered"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_message_from_errors_array() {
        let (_dir, store) = temp_store();
        let body = r#"{"errors":[{"msg":"Invalid email format."},{"msg":"ignored"}]}"#;
        let err = error_for_status(400, body, &store);
        match err {
            ApiError::Validation(message) => assert_eq!(message, "Invalid email format."),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_request_without_payload_falls_back() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            error_for_status(400, "not json", &store),
            ApiError::Status(400)
        ));
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("Web Development"), "Web%20Development");
        assert_eq!(percent_encode("AI/Machine Learning"), "AI%2FMachine%20Learning");
        assert_eq!(percent_encode("plain-segment_1.0~x"), "plain-segment_1.0~x");
    }
}
