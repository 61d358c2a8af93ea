//! Remote HTTP API client.
//!
//! Thin async wrapper over `reqwest` for the observability platform's
//! configuration API. Every request carries `Authorization: apiToken <token>`
//! and JSON bodies; responses are returned as raw `serde_json::Value` so
//! element payloads round-trip without a schema.
//!
//! Requests are awaited one at a time by the orchestrators. The client does
//! not retry; callers decide what a failure means for their element.

mod smart_alerts;

pub use smart_alerts::{
    ENDPOINT_ORDER, SmartAlertKind, classify_smart_alert, get_smart_alert, list_smart_alerts,
};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ConnectionSettings;

/// Custom dashboards collection.
pub const DASHBOARDS_PATH: &str = "api/custom-dashboard";
/// Custom event specifications collection.
pub const EVENTS_PATH: &str = "api/events/settings/event-specifications/custom";
/// Custom entity types collection.
pub const ENTITIES_PATH: &str = "api/custom-entitytypes";

/// Errors returned by the remote API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("request failed with status code {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, parsed as JSON when possible.
        body: Value,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be read as JSON.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    /// HTTP status code, if the server responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if the server responded.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for `409 Conflict`.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409))
    }

    /// Render the error for a log line.
    ///
    /// HTTP errors show the status code, plus the response body in debug
    /// mode. Other errors are stringified.
    #[must_use]
    pub fn render(&self, debug: bool) -> String {
        match self {
            Self::Status { status, body } if debug => {
                format!("status {status}, response data: {body}")
            }
            Self::Status { status, .. } => format!("status {status}"),
            other => other.to_string(),
        }
    }
}

/// Result type for remote API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Client for the platform's configuration API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if the TLS backend cannot be initialized.
    pub fn new(settings: &ConnectionSettings) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `api/custom-dashboard/abc`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("apiToken {}", self.token))
            .header(CONTENT_TYPE, "application/json")
    }

    /// `GET` a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn get_json(&self, path: &str) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    /// `POST` a JSON document and return the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn post_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.client.post(url).json(body)).await
    }

    /// `PUT` a JSON document and return the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn put_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(%url, "PUT");
        self.send(self.client.put(url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: parse_body(&text),
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Parse an error body as JSON, keeping plain text as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(server: &str) -> ConnectionSettings {
        ConnectionSettings::new(server, "secret", false).unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let client = ApiClient::new(&settings("tenant.example.io/")).unwrap();
        assert_eq!(client.base_url(), "https://tenant.example.io");
        assert_eq!(
            client.url(DASHBOARDS_PATH),
            "https://tenant.example.io/api/custom-dashboard"
        );
        assert_eq!(
            client.url("/api/custom-entitytypes/e1"),
            "https://tenant.example.io/api/custom-entitytypes/e1"
        );
    }

    #[test]
    fn test_render_hides_body_unless_debug() {
        let err = ApiError::Status {
            status: 500,
            body: json!({"message": "boom"}),
        };
        assert_eq!(err.render(false), "status 500");
        assert!(err.render(true).contains("boom"));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_conflict_detection() {
        let err = ApiError::Status {
            status: 409,
            body: json!({"conflictingEntityId": "e1"}),
        };
        assert!(err.is_conflict());
        assert_eq!(err.body().unwrap()["conflictingEntityId"], "e1");
    }

    #[test]
    fn test_parse_body_keeps_plain_text() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("oops"), Value::String("oops".to_string()));
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
    }
}
