//! End-to-End Job Flow Tests
//!
//! These tests drive complete jobs through the public API: submission to the
//! gatekeeper, admission by a coordinator replica, fan-out to the worker pool
//! against the SDK mock, and the updates delivered to subscribers.

use std::sync::Arc;
use std::time::Duration;

use stargazer::services::{spawn_gatekeeper, ConsolePresenter};
use stargazer::{
    Admission, Config, GatekeeperHandle, JobHandle, JobUpdate, PresentationEvent, RepoKey,
    StargazerSystem,
};
use stargazer_sdk::testing::{transient_error, MockGithubClient, STARGAZERS, STARRED};
use tokio::sync::mpsc;

// ============================================================================
// Test Helpers
// ============================================================================

fn key(full_name: &str) -> RepoKey {
    full_name.parse().expect("valid repo key")
}

fn test_config(replicas: usize) -> Config {
    Config {
        coordinator_replicas: replicas,
        worker_pool_size: 4,
        publish_interval: Duration::from_millis(50),
        ..Config::default()
    }
}

fn start(
    mock: &MockGithubClient,
    replicas: usize,
) -> (GatekeeperHandle, mpsc::UnboundedReceiver<PresentationEvent>) {
    let (presentation_tx, presentation_rx) = mpsc::unbounded_channel();
    let gatekeeper = spawn_gatekeeper(
        &test_config(replicas),
        Arc::new(mock.clone()),
        presentation_tx,
    );
    (gatekeeper, presentation_rx)
}

fn expect_accepted(admission: Admission) -> JobHandle {
    match admission {
        Admission::Accepted(job) => job,
        Admission::Rejected { repo } => panic!("{repo} was rejected"),
    }
}

async fn terminal_update(job: &JobHandle) -> Option<JobUpdate> {
    let mut updates = job.subscribe();
    while let Some(update) = updates.recv().await {
        if update.is_terminal() {
            return Some(update);
        }
    }
    None
}

fn ranking(update: &JobUpdate) -> Vec<(String, u32)> {
    match update {
        JobUpdate::Completed { similar, .. } => similar
            .iter()
            .map(|e| (e.repo().to_string(), e.shared_starrer_count))
            .collect(),
        other => panic!("expected completion, got {other:?}"),
    }
}

fn scenario_mock() -> MockGithubClient {
    MockGithubClient::new()
        .with_stargazers("octo/app", &["alice", "bob", "carol"])
        .with_starred("alice", &["octo/x", "octo/y"])
        .with_starred("bob", &["octo/x"])
        .fail_starred("carol", 3, transient_error())
}

// ============================================================================
// Job Flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_job_ranks_similar_repositories() {
    let mock = scenario_mock();
    let (gatekeeper, mut presentation) = start(&mock, 1);

    let job = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    assert_eq!(job.repo, key("octo/app"));

    let PresentationEvent::OpenResults { handle } = presentation.recv().await.unwrap();
    assert_eq!(handle.job_id, job.job_id);

    let update = terminal_update(&job).await.expect("job should finish");
    assert_eq!(
        ranking(&update),
        vec![("octo/x".to_string(), 2), ("octo/y".to_string(), 1)]
    );
    let JobUpdate::Completed { stats, .. } = update else {
        unreachable!()
    };
    assert_eq!(stats.completed_user_count(), 2);
    assert_eq!(stats.failed_user_count(), 1);
    assert_eq!(mock.call_count_for(STARRED, "carol"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_frees_the_coordinator() {
    let mock = scenario_mock().fail_stargazers("octo/app", 4, transient_error());
    let (gatekeeper, _presentation) = start(&mock, 1);

    let job = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    assert_eq!(
        terminal_update(&job).await,
        Some(JobUpdate::Failed {
            repo: key("octo/app")
        })
    );
    assert_eq!(mock.call_count_for(STARGAZERS, "octo/app"), 4);

    // The scripted failures are used up, so a resubmission succeeds.
    let retry = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    let update = terminal_update(&retry).await.expect("job should finish");
    assert_eq!(ranking(&update).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_busy_single_replica_rejects_second_job() {
    let mock = scenario_mock().with_delay(Duration::from_millis(200));
    let (gatekeeper, _presentation) = start(&mock, 1);

    let job = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    let Admission::Rejected { repo } = gatekeeper.submit(key("octo/other")).await else {
        panic!("second job should be rejected while the first runs");
    };
    assert_eq!(repo, key("octo/other"));

    terminal_update(&job).await.expect("job should finish");
    let next = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    assert_ne!(next.job_id, job.job_id);
}

#[tokio::test(start_paused = true)]
async fn test_second_replica_takes_job_while_first_is_busy() {
    let mock = scenario_mock()
        .with_stargazers("octo/other", &["bob"])
        .with_delay(Duration::from_millis(200));
    let (gatekeeper, _presentation) = start(&mock, 2);

    let first = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    let second = expect_accepted(gatekeeper.submit(key("octo/other")).await);

    let (first, second) = tokio::join!(terminal_update(&first), terminal_update(&second));
    assert_eq!(ranking(&first.unwrap()).len(), 2);
    assert_eq!(
        ranking(&second.unwrap()),
        vec![("octo/x".to_string(), 1)]
    );

    // Both replicas are idle again.
    expect_accepted(gatekeeper.submit(key("octo/app")).await);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_submissions_are_serialized() {
    let mock = scenario_mock().with_delay(Duration::from_millis(100));
    let (gatekeeper, _presentation) = start(&mock, 1);

    let submissions = ["octo/app", "octo/b", "octo/c"].map(|repo| {
        let gatekeeper = gatekeeper.clone();
        tokio::spawn(async move { gatekeeper.submit(key(repo)).await })
    });

    let mut accepted = 0;
    for submission in submissions {
        if submission.await.unwrap().is_accepted() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_receives_outcome() {
    let (gatekeeper, _presentation) = start(&scenario_mock(), 1);

    let job = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    let live = terminal_update(&job).await;
    let late = terminal_update(&job).await;

    assert!(live.is_some());
    assert_eq!(live, late);
}

// ============================================================================
// Presentation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_console_presenter_follows_job_to_the_end() {
    let (gatekeeper, mut presentation) = start(&scenario_mock(), 1);

    let job = expect_accepted(gatekeeper.submit(key("octo/app")).await);
    let PresentationEvent::OpenResults { handle } = presentation.recv().await.unwrap();

    let rendered = ConsolePresenter::new(1).render(handle).await;
    assert_eq!(rendered, terminal_update(&job).await);
}

#[tokio::test(start_paused = true)]
async fn test_system_runs_jobs_back_to_back() {
    let system = StargazerSystem::start(&test_config(1), Arc::new(scenario_mock()));

    for _ in 0..2 {
        let job = expect_accepted(system.gatekeeper.submit(key("octo/app")).await);
        let update = terminal_update(&job).await.expect("job should finish");
        assert_eq!(ranking(&update).len(), 2);
    }
}
