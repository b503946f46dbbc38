//! Updates pushed to job subscribers

use serde::{Deserialize, Serialize};

use super::{ProgressStats, RepoKey, SimilarRepoEntry};

/// A message delivered to every subscriber of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobUpdate {
    /// Periodic snapshot while the job runs
    Progress(ProgressStats),
    /// Final ranking, subject excluded
    Completed {
        stats: ProgressStats,
        similar: Vec<SimilarRepoEntry>,
    },
    /// The stargazer listing could not be fetched
    Failed { repo: RepoKey },
}

impl JobUpdate {
    /// Whether no further updates follow this one
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}
