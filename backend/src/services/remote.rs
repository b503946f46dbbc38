//! Remote query client
//!
//! The coordination core only knows this trait. The GitHub SDK client and its
//! scriptable mock both implement it.

use async_trait::async_trait;
use stargazer_sdk::testing::MockGithubClient;
use stargazer_sdk::{GithubClient, Repository};
use tracing::warn;

use crate::models::{Query, RepoKey, RepoListing, UserId};

/// Failure of a single remote query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Worth another attempt (rate limit, 5xx, network)
    #[error("Transient remote failure: {0}")]
    Transient(String),
    /// Retrying cannot help (missing repository, bad credentials)
    #[error("Permanent remote failure: {0}")]
    Permanent(String),
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<stargazer_sdk::Error> for RemoteError {
    fn from(err: stargazer_sdk::Error) -> Self {
        if err.is_retryable() {
            Self::Transient(err.to_string())
        } else {
            Self::Permanent(err.to_string())
        }
    }
}

/// Result of executing a [`Query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Stargazers(Vec<UserId>),
    StarredRepos(Vec<RepoListing>),
}

/// Source of star relationships
#[async_trait]
pub trait RemoteQueryClient: Send + Sync + 'static {
    /// Users who starred `repo`.
    async fn list_stargazers(&self, repo: &RepoKey) -> Result<Vec<UserId>, RemoteError>;

    /// Repositories starred by `user`.
    async fn list_starred_repos(&self, user: &UserId) -> Result<Vec<RepoListing>, RemoteError>;

    /// Run whichever listing `query` asks for.
    async fn execute(&self, query: &Query) -> Result<QueryOutput, RemoteError> {
        match query {
            Query::ListStargazers(repo) => {
                self.list_stargazers(repo).await.map(QueryOutput::Stargazers)
            }
            Query::ListStarredRepos(user) => self
                .list_starred_repos(user)
                .await
                .map(QueryOutput::StarredRepos),
        }
    }
}

/// Convert SDK repositories, dropping any the API returned with an unusable name.
fn to_listings(user: &UserId, repos: Vec<Repository>) -> Vec<RepoListing> {
    repos
        .into_iter()
        .filter_map(|repo| match RepoListing::try_from(repo) {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!(user = %user, error = %e, "Skipping starred repository");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RemoteQueryClient for GithubClient {
    async fn list_stargazers(&self, repo: &RepoKey) -> Result<Vec<UserId>, RemoteError> {
        let users = self.stargazers(repo.owner(), repo.name()).await?;
        Ok(users.into_iter().map(UserId::from).collect())
    }

    async fn list_starred_repos(&self, user: &UserId) -> Result<Vec<RepoListing>, RemoteError> {
        let repos = self.starred(user.as_str()).await?;
        Ok(to_listings(user, repos))
    }
}

#[async_trait]
impl RemoteQueryClient for MockGithubClient {
    async fn list_stargazers(&self, repo: &RepoKey) -> Result<Vec<UserId>, RemoteError> {
        let users = self.stargazers(repo.owner(), repo.name()).await?;
        Ok(users.into_iter().map(UserId::from).collect())
    }

    async fn list_starred_repos(&self, user: &UserId) -> Result<Vec<RepoListing>, RemoteError> {
        let repos = self.starred(user.as_str()).await?;
        Ok(to_listings(user, repos))
    }
}
