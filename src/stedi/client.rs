//! Shared HTTP client and response handling.

use crate::config::StediConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Errors returned by the translation and mapping services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ServiceError {
    /// Whether repeating the same request could succeed.
    ///
    /// Transport failures (including connections dropped mid-request and
    /// interrupted bodies), throttling and server errors are transient.
    /// Client errors, bad payloads and misconfigured requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            ServiceError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || status.is_server_error()
            }
            ServiceError::Decode(_) | ServiceError::Config(_) => false,
        }
    }
}

/// Build the HTTP client shared by both services.
pub fn build_http_client(config: &StediConfig) -> Result<reqwest::Client, ServiceError> {
    Ok(http_client_builder(config)?.build()?)
}

/// Client builder with authentication headers and timeout applied.
///
/// Every request carries `Authorization: Key <api_key>` and a JSON content type.
pub fn http_client_builder(config: &StediConfig) -> Result<reqwest::ClientBuilder, ServiceError> {
    let mut auth = HeaderValue::from_str(&format!("Key {}", config.api_key.trim()))
        .map_err(|_| ServiceError::Config("API key contains invalid header characters".to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(builder)
}

/// Pass through successful responses; turn anything else into [`ServiceError::Status`].
async fn check_status(res: Response) -> Result<Response, ServiceError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    Err(ServiceError::Status { status, body })
}

/// Read a successful response as a JSON value.
pub(crate) async fn read_json(res: Response) -> Result<serde_json::Value, ServiceError> {
    let body = check_status(res).await?.bytes().await?;
    serde_json::from_slice(&body).map_err(ServiceError::Decode)
}
