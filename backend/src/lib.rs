//! Stargazer - similar repository discovery
//!
//! This library provides the coordination core: a gatekeeper admitting one
//! job at a time, coordinators that fan queries out to a bounded worker pool,
//! and the models they exchange.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{Config, ConfigError};
pub use error::AppError;

pub use models::{
    JobUpdate, ModelError, ProgressStats, Query, RepoKey, RepoListing, RetryableQuery,
    SimilarRepoEntry, SimilarityIndex, UserId,
};

pub use services::{
    Admission, ConsolePresenter, GatekeeperHandle, JobHandle, PresentationEvent, RemoteError,
    RemoteQueryClient, StargazerSystem,
};
