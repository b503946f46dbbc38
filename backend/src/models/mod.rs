pub mod job;
pub mod progress;
pub mod query;
pub mod repo;
pub mod similarity;

pub use job::*;
pub use progress::*;
pub use query::*;
pub use repo::*;
pub use similarity::*;
