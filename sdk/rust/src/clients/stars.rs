//! Stars resource client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::transport::HttpTransport;
use crate::types::{Repository, Stargazer};

/// Pagination limits for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Items requested per page (GitHub caps this at 100)
    pub per_page: u32,
    /// Maximum number of pages fetched per listing
    pub max_pages: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_pages: 10,
        }
    }
}

/// Client for stargazer and starred-repository listings.
pub struct StarsClient {
    transport: Arc<HttpTransport>,
    pages: PageConfig,
}

impl StarsClient {
    /// Create a new stars client.
    pub fn new(transport: Arc<HttpTransport>, pages: PageConfig) -> Self {
        Self { transport, pages }
    }

    /// List the users who starred `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not found, the request is rate
    /// limited, or the transport fails on any page.
    pub async fn stargazers(&self, owner: &str, name: &str) -> Result<Vec<Stargazer>, Error> {
        self.list_all(&format!("/repos/{owner}/{name}/stargazers"))
            .await
    }

    /// List the repositories starred by `login`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not found, the request is rate
    /// limited, or the transport fails on any page.
    pub async fn starred(&self, login: &str) -> Result<Vec<Repository>, Error> {
        self.list_all(&format!("/users/{login}/starred")).await
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let per_page = self.pages.per_page.clamp(1, 100);
        let mut items = Vec::new();

        for page in 1..=self.pages.max_pages.max(1) {
            let batch: Vec<T> = self
                .transport
                .get(
                    path,
                    &[
                        ("per_page", per_page.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let short_page = batch.len() < per_page as usize;
            items.extend(batch);

            if short_page {
                break;
            }
        }

        debug!(path = %path, count = items.len(), "listing fetched");
        Ok(items)
    }
}
