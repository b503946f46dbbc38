//! Resource clients for the stargazer SDK.

pub mod stars;

// Re-exports
pub use stars::{PageConfig, StarsClient};
