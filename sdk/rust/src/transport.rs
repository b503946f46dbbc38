//! HTTP transport for the stargazer SDK.
//!
//! Handles HTTP communication with GitHub, authentication headers, and error
//! classification. Requests are attempted exactly once: retry policy belongs
//! to the caller, which owns the retry budget.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, GithubError};

/// GitHub REST API version header value.
pub const API_VERSION: &str = "2022-11-28";

/// Fallback wait when a rate limited response carries no hint.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP transport layer with token authentication.
pub struct HttpTransport {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for API requests (e.g., "<https://api.github.com>")
    /// * `token` - Optional personal access token
    /// * `timeout` - Request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    /// Issue a GET request and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` on network failures and `Error::Github` on
    /// non-success responses.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GitHub GET");

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, concat!("stargazer/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(params);

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| Error::Http(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| Error::Http(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error_response(response).await)
    }

    /// Parse an error response into a typed error.
    async fn parse_error_response(response: Response) -> Error {
        let status = response.status();
        let headers = response.headers();
        let header_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
        };
        let retry_after = header_u64("retry-after");
        let remaining = header_u64("x-ratelimit-remaining");

        let data: Value = response.json().await.unwrap_or_else(|_| serde_json::json!({}));
        let message = data
            .get("message")
            .and_then(|v| v.as_str())
            .map_or_else(|| format!("HTTP {}", status.as_u16()), String::from);

        Error::Github(classify_status(status, remaining, retry_after, message))
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry an Authorization header.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Map a failed status and the rate limit headers to a typed error.
///
/// GitHub signals primary rate limit exhaustion with a 403 and
/// `x-ratelimit-remaining: 0`, and secondary limits with 403 or 429 plus
/// `retry-after`.
pub fn classify_status(
    status: StatusCode,
    rate_limit_remaining: Option<u64>,
    retry_after: Option<u64>,
    message: String,
) -> GithubError {
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED => GithubError::Authentication {
            status: code,
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => GithubError::RateLimited {
            status: code,
            message,
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::FORBIDDEN if rate_limit_remaining == Some(0) || retry_after.is_some() => {
            GithubError::RateLimited {
                status: code,
                message,
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            }
        }
        StatusCode::FORBIDDEN => GithubError::Authorization {
            status: code,
            message,
        },
        StatusCode::NOT_FOUND => GithubError::NotFound {
            status: code,
            message,
        },
        s if s.is_server_error() => GithubError::Server {
            status: code,
            message,
        },
        _ => GithubError::Validation {
            status: code,
            message,
        },
    }
}
