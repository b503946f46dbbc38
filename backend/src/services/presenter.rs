//! Console presentation layer
//!
//! Opens a render loop for every admitted job and logs its updates until a
//! terminal one arrives or the coordinator closes the channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::coordinator::JobHandle;
use crate::models::{JobUpdate, ProgressStats, SimilarRepoEntry};

/// Default number of ranked repositories shown for a finished job
pub const DEFAULT_TOP_RESULTS: usize = 25;

/// Notifications from the gatekeeper to the presentation layer
#[derive(Debug, Clone)]
pub enum PresentationEvent {
    /// A job was admitted; subscribe to follow it
    OpenResults { handle: JobHandle },
}

/// `completed/expected (failed)` progress line
pub fn format_progress(stats: &ProgressStats) -> String {
    let expected = stats
        .expected_user_count()
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    format!(
        "{}/{} ({} failed)",
        stats.completed_user_count(),
        expected,
        stats.failed_user_count()
    )
}

/// One line per entry for the first `top` entries of a ranking.
pub fn format_ranking(similar: &[SimilarRepoEntry], top: usize) -> Vec<String> {
    similar
        .iter()
        .take(top)
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>3}. {}/{}  shared={}  stars={}  {}",
                i + 1,
                entry.repo().owner(),
                entry.repo().name(),
                entry.shared_starrer_count,
                entry.listing.stargazers_count,
                entry.listing.html_url
            )
        })
        .collect()
}

/// Presenter that writes job updates to the log
#[derive(Debug, Clone)]
pub struct ConsolePresenter {
    top_results: usize,
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_RESULTS)
    }
}

impl ConsolePresenter {
    pub fn new(top_results: usize) -> Self {
        Self { top_results }
    }

    /// Consume presentation events until the gatekeeper goes away.
    pub fn spawn(self, mut events: mpsc::UnboundedReceiver<PresentationEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    PresentationEvent::OpenResults { handle } => {
                        tokio::spawn(self.clone().render(handle));
                    }
                }
            }
        })
    }

    /// Follow one job to its end. Returns the terminal update, if any.
    pub async fn render(self, handle: JobHandle) -> Option<JobUpdate> {
        info!(job_id = %handle.job_id, repo = %handle.repo, "Showing results");
        let mut updates = handle.subscribe();

        while let Some(update) = updates.recv().await {
            match &update {
                JobUpdate::Progress(stats) => {
                    info!(repo = %handle.repo, progress = %format_progress(stats), "Progress");
                }
                JobUpdate::Completed { stats, similar } => {
                    info!(
                        repo = %handle.repo,
                        progress = %format_progress(stats),
                        similar = similar.len(),
                        "Similar repositories"
                    );
                    for line in format_ranking(similar, self.top_results) {
                        info!("{line}");
                    }
                }
                JobUpdate::Failed { repo } => {
                    error!(repo = %repo, "Could not list stargazers, job failed");
                }
            }
            if update.is_terminal() {
                return Some(update);
            }
        }

        warn!(job_id = %handle.job_id, "Job ended without a result");
        None
    }
}
