//! Repository and user identity types
//!
//! A repository is identified by its `owner/name` pair exactly as the remote
//! source spells it. Listing metadata travels with the key but never takes
//! part in equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use stargazer_sdk::{Repository, Stargazer};

/// Errors raised while building model values from user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid repository key '{0}': expected owner/name")]
    InvalidRepoKey(String),
}

/// Immutable `owner/name` identity of a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoKey {
    owner: String,
    name: String,
}

impl RepoKey {
    /// Build a key from its two segments.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, ModelError> {
        let owner = owner.into();
        let name = name.into();
        if !valid_segment(&owner) || !valid_segment(&name) {
            return Err(ModelError::InvalidRepoKey(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/') && !segment.chars().any(char::is_whitespace)
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| ModelError::InvalidRepoKey(s.to_string()))?;
        Self::new(owner, name).map_err(|_| ModelError::InvalidRepoKey(s.to_string()))
    }
}

/// Login of a remote user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Stargazer> for UserId {
    fn from(stargazer: Stargazer) -> Self {
        Self(stargazer.login)
    }
}

/// One repository as returned by a starred-repositories listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoListing {
    pub key: RepoKey,
    pub html_url: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
}

impl RepoListing {
    /// Listing with no metadata, used where only the identity matters.
    pub fn bare(key: RepoKey) -> Self {
        Self {
            html_url: format!("https://github.com/{key}"),
            key,
            stargazers_count: 0,
            forks_count: 0,
            open_issues_count: 0,
        }
    }
}

impl TryFrom<Repository> for RepoListing {
    type Error = ModelError;

    fn try_from(repo: Repository) -> Result<Self, Self::Error> {
        Ok(Self {
            key: RepoKey::new(repo.owner.login, repo.name)?,
            html_url: repo.html_url,
            stargazers_count: repo.stargazers_count,
            forks_count: repo.forks_count,
            open_issues_count: repo.open_issues_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let key: RepoKey = "rust-lang/rust".parse().unwrap();
        assert_eq!(key.owner(), "rust-lang");
        assert_eq!(key.name(), "rust");
        assert_eq!(key.to_string(), "rust-lang/rust");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for raw in ["", "rust", "/rust", "rust-lang/", "a/b/c", "a b/c"] {
            assert_eq!(
                raw.parse::<RepoKey>(),
                Err(ModelError::InvalidRepoKey(raw.to_string())),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        let lower: RepoKey = "octo/app".parse().unwrap();
        let upper: RepoKey = "Octo/App".parse().unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_listing_from_sdk_repository() {
        let mut repo = stargazer_sdk::testing::repository("tokio-rs/tokio");
        repo.stargazers_count = 27_000;
        let listing = RepoListing::try_from(repo).unwrap();

        assert_eq!(listing.key.to_string(), "tokio-rs/tokio");
        assert_eq!(listing.stargazers_count, 27_000);
        assert_eq!(listing.html_url, "https://github.com/tokio-rs/tokio");
    }

    #[test]
    fn test_serializes_as_camel_case() {
        let listing = RepoListing::bare("octo/app".parse().unwrap());
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["htmlUrl"], "https://github.com/octo/app");
        assert_eq!(json["key"]["owner"], "octo");
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9._-]{0,38}"
    }

    mod property_repo_key_text {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            /// Display output parses back to the same key
            #[test]
            fn display_parses_back(owner in segment_strategy(), name in segment_strategy()) {
                let key = RepoKey::new(owner, name).unwrap();
                let reparsed: RepoKey = key.to_string().parse().unwrap();
                prop_assert_eq!(reparsed, key);
            }
        }
    }
}
