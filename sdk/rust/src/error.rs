//! Error types for the stargazer SDK.

use thiserror::Error;

/// Main error type for the stargazer SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error (connection refused, timeout, malformed body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// GitHub API error
    #[error(transparent)]
    Github(#[from] GithubError),
}

impl Error {
    /// Check if retrying the same request may succeed.
    ///
    /// Transport failures are treated as transient; API errors defer to
    /// [`GithubError::is_retryable`].
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Github(e) => e.is_retryable(),
            Self::Serialization(_) | Self::Configuration(_) => false,
        }
    }
}

/// Typed errors for GitHub API responses.
///
/// Each variant corresponds to a status class returned by the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GithubError {
    /// Bad or expired token (401).
    #[error("[{status}] {message}")]
    Authentication { status: u16, message: String },

    /// Access denied without rate limit exhaustion (403).
    #[error("[{status}] {message}")]
    Authorization { status: u16, message: String },

    /// Repository or user does not exist (404).
    #[error("[{status}] {message}")]
    NotFound { status: u16, message: String },

    /// Primary or secondary rate limit hit (403 with exhausted quota, or 429).
    #[error("[{status}] {message} (retry after {retry_after}s)")]
    RateLimited {
        status: u16,
        message: String,
        retry_after: u64,
    },

    /// Any other 4xx response.
    #[error("[{status}] {message}")]
    Validation { status: u16, message: String },

    /// Server errors (5xx).
    #[error("[{status}] {message}")]
    Server { status: u16, message: String },
}

impl GithubError {
    /// Get the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Authentication { status, .. }
            | Self::Authorization { status, .. }
            | Self::NotFound { status, .. }
            | Self::RateLimited { status, .. }
            | Self::Validation { status, .. }
            | Self::Server { status, .. } => *status,
        }
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::Authorization { message, .. }
            | Self::NotFound { message, .. }
            | Self::RateLimited { message, .. }
            | Self::Validation { message, .. }
            | Self::Server { message, .. } => message,
        }
    }

    /// Get the retry-after value for rate limited errors.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_error_accessors() {
        let error = GithubError::NotFound {
            status: 404,
            message: "Not Found".to_string(),
        };

        assert_eq!(error.status(), 404);
        assert_eq!(error.message(), "Not Found");
        assert_eq!(error.retry_after(), None);
    }

    #[test]
    fn test_rate_limited_error() {
        let error = GithubError::RateLimited {
            status: 403,
            message: "API rate limit exceeded".to_string(),
            retry_after: 30,
        };

        assert_eq!(error.retry_after(), Some(30));
        assert!(error.is_retryable());
        assert!(error.to_string().contains("retry after 30s"));
    }

    #[test]
    fn test_non_retryable_errors() {
        let auth_error = GithubError::Authentication {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        assert!(!auth_error.is_retryable());

        let not_found = GithubError::NotFound {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(Error::Http("connection reset".to_string()).is_retryable());
        assert!(!Error::Configuration("bad url".to_string()).is_retryable());

        let server = Error::Github(GithubError::Server {
            status: 502,
            message: "Bad Gateway".to_string(),
        });
        assert!(server.is_retryable());
    }
}
