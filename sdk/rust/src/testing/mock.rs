//! Mock GitHub client for testing.
//!
//! Provides a `MockGithubClient` that mimics the real client interface
//! without making network calls. Listings are configured up front, failures
//! are scripted per key, and every call is recorded.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Error, GithubError};
use crate::types::{Owner, Repository, Stargazer};

/// Method name recorded for stargazer listings.
pub const STARGAZERS: &str = "stars.stargazers";
/// Method name recorded for starred-repository listings.
pub const STARRED: &str = "stars.starred";

/// Record of a method call.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Method name (`stars.stargazers` or `stars.starred`)
    pub method: String,
    /// Arguments passed to the method
    pub args: Vec<String>,
    /// Timestamp of the call
    pub timestamp: DateTime<Utc>,
}

impl MockCall {
    /// Create a new mock call record.
    pub fn new(method: &str, args: Vec<String>) -> Self {
        Self {
            method: method.to_string(),
            args,
            timestamp: Utc::now(),
        }
    }
}

/// A failure scripted for the next `remaining` calls on one key.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    remaining: u32,
    error: GithubError,
}

/// Internal state for the mock client.
#[derive(Default)]
struct MockClientState {
    stargazers: HashMap<String, Vec<Stargazer>>,
    starred: HashMap<String, Vec<Repository>>,
    failures: HashMap<String, ScriptedFailure>,
    panics: HashSet<String>,
    delay: Option<Duration>,
    calls: Vec<MockCall>,
}

impl MockClientState {
    fn record_call(&mut self, method: &str, args: Vec<String>) {
        self.calls.push(MockCall::new(method, args));
    }

    /// Consume one scripted failure for `key`, if any remain.
    fn take_failure(&mut self, key: &str) -> Option<GithubError> {
        let failure = self.failures.get_mut(key)?;
        if failure.remaining == 0 {
            return None;
        }
        if failure.remaining != u32::MAX {
            failure.remaining -= 1;
        }
        Some(failure.error.clone())
    }
}

/// Build a `Repository` listing from an `owner/name` string.
#[must_use]
pub fn repository(full_name: &str) -> Repository {
    let (owner, name) = full_name.split_once('/').unwrap_or(("unknown", full_name));
    Repository {
        name: name.to_string(),
        full_name: format!("{owner}/{name}"),
        owner: Owner {
            login: owner.to_string(),
        },
        html_url: format!("https://github.com/{owner}/{name}"),
        description: None,
        fork: false,
        stargazers_count: 0,
        forks_count: 0,
        open_issues_count: 0,
        updated_at: None,
    }
}

/// A transient server error (502), retryable.
#[must_use]
pub fn transient_error() -> GithubError {
    GithubError::Server {
        status: 502,
        message: "Bad Gateway".to_string(),
    }
}

/// A permanent not-found error (404), not retryable.
#[must_use]
pub fn not_found_error() -> GithubError {
    GithubError::NotFound {
        status: 404,
        message: "Not Found".to_string(),
    }
}

/// Mock GitHub client for testing.
///
/// Cloning shares state, so a test can keep one handle for assertions while
/// another is owned by the code under test.
#[derive(Clone, Default)]
pub struct MockGithubClient {
    state: Arc<Mutex<MockClientState>>,
}

impl MockGithubClient {
    /// Create an empty mock: unknown repositories are 404, unknown users have
    /// starred nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockClientState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configure the stargazers of `owner/name`.
    #[must_use]
    pub fn with_stargazers(self, full_name: &str, logins: &[&str]) -> Self {
        let users = logins
            .iter()
            .enumerate()
            .map(|(i, login)| Stargazer {
                login: (*login).to_string(),
                id: i as u64 + 1,
                html_url: Some(format!("https://github.com/{login}")),
            })
            .collect();
        self.lock().stargazers.insert(full_name.to_string(), users);
        self
    }

    /// Configure the repositories starred by `login`, each as `owner/name`.
    #[must_use]
    pub fn with_starred(self, login: &str, repos: &[&str]) -> Self {
        let repos = repos.iter().map(|r| repository(r)).collect();
        self.lock().starred.insert(login.to_string(), repos);
        self
    }

    /// Fail the next `times` stargazer listings of `owner/name` with `error`.
    /// `u32::MAX` fails forever.
    #[must_use]
    pub fn fail_stargazers(self, full_name: &str, times: u32, error: GithubError) -> Self {
        self.lock().failures.insert(
            format!("{STARGAZERS}:{full_name}"),
            ScriptedFailure {
                remaining: times,
                error,
            },
        );
        self
    }

    /// Fail the next `times` starred listings of `login` with `error`.
    /// `u32::MAX` fails forever.
    #[must_use]
    pub fn fail_starred(self, login: &str, times: u32, error: GithubError) -> Self {
        self.lock().failures.insert(
            format!("{STARRED}:{login}"),
            ScriptedFailure {
                remaining: times,
                error,
            },
        );
        self
    }

    /// Panic inside the starred listing of `login`, simulating a client bug.
    #[must_use]
    pub fn panic_on_starred(self, login: &str) -> Self {
        self.lock().panics.insert(format!("{STARRED}:{login}"));
        self
    }

    /// Delay every call by `delay` before answering.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Mock stargazer listing.
    ///
    /// # Errors
    ///
    /// Returns the scripted failure if one is pending, or `NotFound` for an
    /// unconfigured repository.
    pub async fn stargazers(&self, owner: &str, name: &str) -> Result<Vec<Stargazer>, Error> {
        let full_name = format!("{owner}/{name}");
        let delay = {
            let mut state = self.lock();
            state.record_call(STARGAZERS, vec![full_name.clone()]);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if let Some(error) = state.take_failure(&format!("{STARGAZERS}:{full_name}")) {
            return Err(Error::Github(error));
        }
        state
            .stargazers
            .get(&full_name)
            .cloned()
            .ok_or_else(|| Error::Github(not_found_error()))
    }

    /// Mock starred listing.
    ///
    /// # Errors
    ///
    /// Returns the scripted failure if one is pending.
    pub async fn starred(&self, login: &str) -> Result<Vec<Repository>, Error> {
        let key = format!("{STARRED}:{login}");
        let (delay, panics) = {
            let mut state = self.lock();
            state.record_call(STARRED, vec![login.to_string()]);
            (state.delay, state.panics.contains(&key))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panics {
            panic!("scripted panic while listing stars of {login}");
        }

        let mut state = self.lock();
        if let Some(error) = state.take_failure(&key) {
            return Err(Error::Github(error));
        }
        Ok(state.starred.get(login).cloned().unwrap_or_default())
    }

    /// Check if a method was called.
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().calls.iter().any(|call| call.method == method)
    }

    /// Get the number of times a method was called.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Get the number of calls for one method and first argument.
    #[must_use]
    pub fn call_count_for(&self, method: &str, arg: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method && call.args.first().map(String::as_str) == Some(arg))
            .count()
    }

    /// Get recorded calls, optionally filtered by method.
    #[must_use]
    pub fn get_calls(&self, method: Option<&str>) -> Vec<MockCall> {
        let state = self.lock();
        match method {
            Some(m) => state.calls.iter().filter(|call| call.method == m).cloned().collect(),
            None => state.calls.clone(),
        }
    }

    /// Reset all recorded calls.
    pub fn reset(&self) {
        self.lock().calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_stargazers_configured() {
        let mock = MockGithubClient::new().with_stargazers("octo/app", &["alice", "bob"]);
        let users = mock.stargazers("octo", "app").await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].login, "alice");
        assert!(mock.was_called(STARGAZERS));
        assert_eq!(mock.call_count_for(STARGAZERS, "octo/app"), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_repo_is_not_found() {
        let mock = MockGithubClient::new();
        let err = mock.stargazers("octo", "missing").await.unwrap_err();

        assert!(matches!(err, Error::Github(GithubError::NotFound { .. })));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_mock_unknown_user_starred_nothing() {
        let mock = MockGithubClient::new();
        assert!(mock.starred("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_scripted_failures_run_out() {
        let mock = MockGithubClient::new()
            .with_starred("alice", &["octo/x", "octo/y"])
            .fail_starred("alice", 2, transient_error());

        assert!(mock.starred("alice").await.is_err());
        assert!(mock.starred("alice").await.is_err());
        let repos = mock.starred("alice").await.unwrap();

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[1].full_name, "octo/y");
        assert_eq!(mock.call_count_for(STARRED, "alice"), 3);
    }

    #[tokio::test]
    async fn test_mock_permanent_failure() {
        let mock = MockGithubClient::new()
            .with_stargazers("octo/app", &["alice"])
            .fail_stargazers("octo/app", u32::MAX, transient_error());

        for _ in 0..5 {
            assert!(mock.stargazers("octo", "app").await.unwrap_err().is_retryable());
        }
    }

    #[test]
    fn test_repository_helper() {
        let repo = repository("rust-lang/rust");
        assert_eq!(repo.owner.login, "rust-lang");
        assert_eq!(repo.name, "rust");
        assert_eq!(repo.html_url, "https://github.com/rust-lang/rust");
    }

    #[tokio::test]
    async fn test_mock_get_calls_and_reset() {
        let mock = MockGithubClient::new();

        let _ = mock.starred("a").await;
        let _ = mock.starred("b").await;
        let _ = mock.stargazers("o", "r").await;

        assert_eq!(mock.get_calls(None).len(), 3);
        assert_eq!(mock.get_calls(Some(STARRED)).len(), 2);

        mock.reset();
        assert_eq!(mock.call_count(STARRED), 0);
    }
}
