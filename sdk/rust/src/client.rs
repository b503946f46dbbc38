//! Stargazer SDK main client.
//!
//! Provides the primary interface for reading star relationships from the
//! GitHub REST API.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::{PageConfig, StarsClient};
use crate::error::Error;
use crate::transport::HttpTransport;
use crate::types::{Repository, Stargazer};

/// Default base URL for the GitHub API.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main client for reading stargazers and starred repositories.
///
/// # Example
///
/// ```rust,ignore
/// use stargazer_sdk::GithubClient;
///
/// let client = GithubClient::from_env()?;
/// let users = client.stargazers("rust-lang", "rust").await?;
/// for user in users {
///     let repos = client.starred(&user.login).await?;
///     println!("{} starred {} repos", user.login, repos.len());
/// }
/// ```
pub struct GithubClient {
    transport: Arc<HttpTransport>,
    stars: StarsClient,
}

impl GithubClient {
    /// Create a new GitHub client.
    ///
    /// # Arguments
    ///
    /// * `token` - Optional personal access token (unauthenticated requests
    ///   get a much lower rate limit)
    /// * `base_url` - Base URL for API requests (default: <https://api.github.com>)
    /// * `timeout` - Request timeout (default: 30 seconds)
    /// * `pages` - Pagination limits (default: 100 per page, 10 pages)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn new(
        token: Option<String>,
        base_url: Option<&str>,
        timeout: Option<Duration>,
        pages: Option<PageConfig>,
    ) -> Result<Self, Error> {
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL);
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let transport = Arc::new(HttpTransport::new(base_url, token, timeout)?);

        Ok(Self {
            stars: StarsClient::new(Arc::clone(&transport), pages.unwrap_or_default()),
            transport,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `GITHUB_TOKEN` - Personal access token (optional)
    /// * `GITHUB_API_URL` - Base URL for API (optional, default: <https://api.github.com>)
    /// * `GITHUB_MAX_PAGES` - Page cap per listing (optional, default: 10)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but invalid.
    pub fn from_env() -> Result<Self, Error> {
        let token = env::var("GITHUB_TOKEN").ok();
        let base_url = env::var("GITHUB_API_URL").ok();

        let mut pages = PageConfig::default();
        if let Ok(raw) = env::var("GITHUB_MAX_PAGES") {
            pages.max_pages = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("Invalid GITHUB_MAX_PAGES: {raw}"))
            })?;
        }

        Self::new(token, base_url.as_deref(), None, Some(pages))
    }

    /// Get the underlying HTTP transport (for advanced use cases).
    #[must_use]
    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    /// Get the stars client.
    #[must_use]
    pub fn stars(&self) -> &StarsClient {
        &self.stars
    }

    /// List the users who starred `owner/name`.
    ///
    /// # Errors
    ///
    /// See [`StarsClient::stargazers`].
    pub async fn stargazers(&self, owner: &str, name: &str) -> Result<Vec<Stargazer>, Error> {
        self.stars.stargazers(owner, name).await
    }

    /// List the repositories starred by `login`.
    ///
    /// # Errors
    ///
    /// See [`StarsClient::starred`].
    pub async fn starred(&self, login: &str) -> Result<Vec<Repository>, Error> {
        self.stars.starred(login).await
    }
}
