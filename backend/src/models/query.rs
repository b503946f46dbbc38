//! Remote queries and their retry budget

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RepoKey, UserId};

/// Default attempts for the top-level stargazer listing
pub const DEFAULT_STARGAZER_ATTEMPTS: u32 = 4;
/// Default attempts for each per-user starred listing
pub const DEFAULT_USER_ATTEMPTS: u32 = 3;

/// A single request to the remote source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "camelCase")]
pub enum Query {
    /// Users who starred the job subject
    ListStargazers(RepoKey),
    /// Repositories starred by one of those users
    ListStarredRepos(UserId),
}

impl Query {
    /// Whether this query is the one the whole job depends on
    pub fn is_top_level(&self) -> bool {
        matches!(self, Self::ListStargazers(_))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListStargazers(repo) => write!(f, "stargazers of {repo}"),
            Self::ListStarredRepos(user) => write!(f, "repos starred by {user}"),
        }
    }
}

/// A query paired with the attempts it has left
///
/// Values are immutable: `next_attempt` hands back a new value and the
/// budget only ever shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryableQuery {
    pub query: Query,
    attempts_left: u32,
}

impl RetryableQuery {
    pub fn new(query: Query, attempts_left: u32) -> Self {
        Self {
            query,
            attempts_left,
        }
    }

    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }

    pub fn can_retry(&self) -> bool {
        self.attempts_left > 0
    }

    /// The same query with one attempt spent. Saturates at zero.
    pub fn next_attempt(&self) -> Self {
        Self {
            query: self.query.clone(),
            attempts_left: self.attempts_left.saturating_sub(1),
        }
    }
}
