//! Stargazer SDK for Rust
//!
//! Typed client for the two GitHub REST listings the stargazer analysis
//! needs: who starred a repository, and what a user has starred.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stargazer_sdk::GithubClient;
//!
//! # async fn run() -> Result<(), stargazer_sdk::Error> {
//! let client = GithubClient::from_env()?;
//! let users = client.stargazers("tokio-rs", "tokio").await?;
//! println!("{} stargazers", users.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clients;
pub mod error;
pub mod testing;
pub mod transport;
pub mod types;

// Re-exports
pub use client::GithubClient;
pub use clients::{PageConfig, StarsClient};
pub use error::{Error, GithubError};
pub use transport::{HttpTransport, classify_status};
pub use types::{Owner, Repository, Stargazer};
