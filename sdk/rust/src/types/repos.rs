//! Repository data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository owner (user or organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Owner login
    pub login: String,
}

/// Repository information as listed by the starred endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name without the owner
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Owning account
    pub owner: Owner,
    /// Web URL for the repository
    pub html_url: String,
    /// Repository description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is a fork
    #[serde(default)]
    pub fork: bool,
    /// Number of stars
    #[serde(default)]
    pub stargazers_count: u64,
    /// Number of forks
    #[serde(default)]
    pub forks_count: u64,
    /// Number of open issues
    #[serde(default)]
    pub open_issues_count: u64,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
