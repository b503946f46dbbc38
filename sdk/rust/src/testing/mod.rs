//! Testing utilities for the stargazer SDK.
//!
//! Provides a mock client for testing applications that consume stargazer
//! listings without reaching GitHub.

mod mock;

pub use mock::{
    MockCall, MockGithubClient, STARGAZERS, STARRED, not_found_error, repository,
    transient_error,
};
