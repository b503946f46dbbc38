//! Data model types for the stargazer SDK.

pub mod repos;
pub mod stars;

// Re-exports
pub use repos::{Owner, Repository};
pub use stars::Stargazer;
