use std::fmt;

use crate::config::ConfigError;
use crate::models::{ModelError, RepoKey};

/// Application-level error type
#[derive(Debug)]
pub enum AppError {
    /// Invalid configuration
    Config(ConfigError),
    /// Malformed input, such as a repository argument
    Validation(ModelError),
    /// The GitHub client could not be built
    Client(stargazer_sdk::Error),
    /// The gatekeeper turned the job down
    Rejected(RepoKey),
    /// The stargazer listing of the subject could not be fetched
    JobFailed(RepoKey),
    /// The job's update channel closed before a result
    Interrupted(RepoKey),
    /// Result output could not be written
    Output(String),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Client(_) => 2,
            Self::Rejected(_) | Self::JobFailed(_) | Self::Interrupted(_) | Self::Output(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Validation(e) => write!(f, "Validation error: {e}"),
            Self::Client(e) => write!(f, "Client error: {e}"),
            Self::Rejected(repo) => write!(f, "Job for {repo} was rejected, another job is running"),
            Self::JobFailed(repo) => write!(f, "Job for {repo} failed"),
            Self::Interrupted(repo) => write!(f, "Job for {repo} ended without a result"),
            Self::Output(msg) => write!(f, "Output error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        Self::Validation(err)
    }
}

impl From<stargazer_sdk::Error> for AppError {
    fn from(err: stargazer_sdk::Error) -> Self {
        Self::Client(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
