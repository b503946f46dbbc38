//! Progress accounting for a running job

use serde::{Deserialize, Serialize};

/// Snapshot of how far a job has come
///
/// Every transition returns a new value. `finished` is recomputed on each
/// transition and only holds once the expected user count is known and every
/// user is accounted for, either completed or failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    expected_user_count: Option<u32>,
    completed_user_count: u32,
    failed_user_count: u32,
    finished: bool,
}

impl ProgressStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_user_count(&self) -> Option<u32> {
        self.expected_user_count
    }

    pub fn completed_user_count(&self) -> u32 {
        self.completed_user_count
    }

    pub fn failed_user_count(&self) -> u32 {
        self.failed_user_count
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Users accounted for so far
    pub fn processed_user_count(&self) -> u32 {
        self.completed_user_count + self.failed_user_count
    }

    /// Record how many stargazers the job has to visit.
    pub fn with_expected_users(self, expected: u32) -> Self {
        Self {
            expected_user_count: Some(expected),
            ..self
        }
        .recompute()
    }

    /// Count one user whose starred list was aggregated.
    pub fn user_completed(self) -> Self {
        if !self.has_room() {
            return self;
        }
        Self {
            completed_user_count: self.completed_user_count + 1,
            ..self
        }
        .recompute()
    }

    /// Count one user whose starred list could not be fetched.
    pub fn user_failed(self) -> Self {
        if !self.has_room() {
            return self;
        }
        Self {
            failed_user_count: self.failed_user_count + 1,
            ..self
        }
        .recompute()
    }

    // Before the expected count is known there is no upper bound.
    fn has_room(&self) -> bool {
        self.expected_user_count
            .map_or(true, |expected| self.processed_user_count() < expected)
    }

    fn recompute(self) -> Self {
        Self {
            finished: self.expected_user_count == Some(self.processed_user_count()),
            ..self
        }
    }
}
