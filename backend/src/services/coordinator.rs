//! Job coordinator
//!
//! Owns at most one running job. A job lists the subject's stargazers, then
//! each stargazer's starred repositories, folding the results into a
//! [`SimilarityIndex`]. Failed queries go back to the worker pool while their
//! retry budget lasts. Subscribers receive a progress snapshot on every
//! publish tick and one terminal update when the job ends.
//!
//! Messages are handled one at a time inside a supervision boundary: a panic
//! discards the job (closing every subscriber channel) and the coordinator
//! carries on in `Waiting` with the same mailbox.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::publisher::{PublishTick, PublishTimer, PublishTimerConfig};
use super::remote::{QueryOutput, RemoteError, RemoteQueryClient};
use super::supervision::supervise;
use super::worker_pool::{WorkItem, WorkerPool, WorkerReply};
use crate::config::Config;
use crate::models::{
    JobUpdate, ProgressStats, Query, RepoKey, RetryableQuery, SimilarityIndex, UserId,
};

/// Identifies one admission round and the replica it asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionTicket {
    pub negotiation_id: u64,
    pub replica: usize,
}

/// A replica's answer to [`CoordinatorMsg::CanAcceptJob`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionReply {
    pub ticket: AdmissionTicket,
    pub able: bool,
}

/// Messages accepted by a coordinator mailbox
#[derive(Debug)]
pub enum CoordinatorMsg {
    /// Admission check from the gatekeeper
    CanAcceptJob {
        ticket: AdmissionTicket,
        reply_to: mpsc::UnboundedSender<AdmissionReply>,
    },
    /// Start the job the gatekeeper admitted
    BeginJob { job: JobHandle },
    /// Register a subscriber for a job's updates
    Subscribe {
        job_id: Uuid,
        subscriber: mpsc::UnboundedSender<JobUpdate>,
    },
    #[cfg(test)]
    Crash,
}

/// Cloneable address of a coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMsg>,
}

impl CoordinatorHandle {
    pub(crate) fn from_sender(tx: mpsc::UnboundedSender<CoordinatorMsg>) -> Self {
        Self { tx }
    }

    /// Post a message. Returns false if the coordinator has stopped.
    pub fn send(&self, msg: CoordinatorMsg) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// An admitted job and the coordinator running it
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub repo: RepoKey,
    pub started_at: DateTime<Utc>,
    coordinator: CoordinatorHandle,
}

impl JobHandle {
    pub fn new(repo: RepoKey, coordinator: CoordinatorHandle) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            repo,
            started_at: Utc::now(),
            coordinator,
        }
    }

    /// The coordinator running this job
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }

    /// Receive this job's updates.
    ///
    /// A job that already ended replays its terminal update if it was the
    /// last one its coordinator ran; otherwise the channel closes without a
    /// message.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<JobUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = self.coordinator.send(CoordinatorMsg::Subscribe {
            job_id: self.job_id,
            subscriber: tx,
        });
        if !sent {
            warn!(job_id = %self.job_id, "Coordinator has stopped, subscription closed");
        }
        rx
    }
}

/// Per-job state, dropped wholesale when the job ends
struct ActiveJob {
    job_id: Uuid,
    repo: RepoKey,
    index: SimilarityIndex,
    stats: ProgressStats,
    initial_list_received: bool,
    subscribers: HashMap<u64, mpsc::UnboundedSender<JobUpdate>>,
    next_subscriber_id: u64,
    timer: Option<RunningTimer>,
}

struct RunningTimer {
    generation: u64,
    shutdown: watch::Sender<bool>,
}

impl Drop for RunningTimer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

impl ActiveJob {
    fn new(job_id: Uuid, repo: RepoKey) -> Self {
        Self {
            job_id,
            repo,
            index: SimilarityIndex::new(),
            stats: ProgressStats::new(),
            initial_list_received: false,
            subscribers: HashMap::new(),
            next_subscriber_id: 0,
            timer: None,
        }
    }

    /// Push `update` to every subscriber, forgetting those that hung up.
    fn publish(&mut self, update: &JobUpdate) {
        self.subscribers
            .retain(|_, subscriber| subscriber.send(update.clone()).is_ok());
    }
}

#[derive(Default)]
enum Phase {
    #[default]
    Waiting,
    Working(ActiveJob),
}

/// Everything a restart throws away
#[derive(Default)]
struct CoordinatorState {
    phase: Phase,
    last_outcome: Option<(Uuid, JobUpdate)>,
}

/// The coordinator actor
pub struct JobCoordinator {
    config: Config,
    pool: WorkerPool,
    replies_tx: mpsc::UnboundedSender<WorkerReply>,
    ticks_tx: mpsc::UnboundedSender<PublishTick>,
    timer_generation: u64,
    state: CoordinatorState,
}

impl JobCoordinator {
    /// Spawn a coordinator with its own worker pool.
    pub fn spawn(
        config: &Config,
        client: Arc<dyn RemoteQueryClient>,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (ticks_tx, ticks) = mpsc::unbounded_channel();

        let coordinator = Self {
            config: config.clone(),
            pool: WorkerPool::spawn(config.worker_pool_size, client),
            replies_tx,
            ticks_tx,
            timer_generation: 0,
            state: CoordinatorState::default(),
        };
        let task = tokio::spawn(coordinator.run(mailbox, replies, ticks));

        (CoordinatorHandle::from_sender(tx), task)
    }

    async fn run(
        mut self,
        mut mailbox: mpsc::UnboundedReceiver<CoordinatorMsg>,
        mut replies: mpsc::UnboundedReceiver<WorkerReply>,
        mut ticks: mpsc::UnboundedReceiver<PublishTick>,
    ) {
        info!(workers = self.pool.size(), "Job coordinator started");

        loop {
            // `replies` and `ticks` never close while `self` holds their
            // senders, so the mailbox alone decides when to stop.
            let event = tokio::select! {
                msg = mailbox.recv() => match msg {
                    Some(msg) => Event::Mailbox(msg),
                    None => break,
                },
                Some(reply) = replies.recv() => Event::Worker(reply),
                Some(tick) = ticks.recv() => Event::Tick(tick),
            };

            if let Err(panic) = supervise(|| self.handle(event)) {
                error!(panic = %panic, "Job coordinator crashed, restarting in Waiting");
                self.state = CoordinatorState::default();
            }
        }

        info!("Job coordinator stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Mailbox(CoordinatorMsg::CanAcceptJob { ticket, reply_to }) => {
                let able = self.is_waiting();
                debug!(negotiation_id = ticket.negotiation_id, able, "Admission check");
                let _ = reply_to.send(AdmissionReply { ticket, able });
            }
            Event::Mailbox(CoordinatorMsg::BeginJob { job }) => self.begin_job(job),
            Event::Mailbox(CoordinatorMsg::Subscribe { job_id, subscriber }) => {
                self.subscribe(job_id, subscriber)
            }
            #[cfg(test)]
            Event::Mailbox(CoordinatorMsg::Crash) => panic!("coordinator crash requested"),
            Event::Worker(reply) => self.on_worker_reply(reply),
            Event::Tick(tick) => self.on_publish_tick(tick),
        }
    }

    fn is_waiting(&self) -> bool {
        matches!(self.state.phase, Phase::Waiting)
    }

    fn begin_job(&mut self, job: JobHandle) {
        if let Phase::Working(active) = &self.state.phase {
            warn!(
                running = %active.job_id,
                ignored = %job.job_id,
                "BeginJob while a job is running, ignoring"
            );
            return;
        }

        info!(job_id = %job.job_id, repo = %job.repo, "Job started");
        let query = RetryableQuery::new(
            Query::ListStargazers(job.repo.clone()),
            self.config.stargazer_attempts,
        );
        self.state.phase = Phase::Working(ActiveJob::new(job.job_id, job.repo));
        self.dispatch(job.job_id, query);
    }

    fn dispatch(&mut self, job_id: Uuid, query: RetryableQuery) {
        self.pool.submit(WorkItem {
            job_id,
            query,
            reply_to: self.replies_tx.clone(),
        });
    }

    fn subscribe(&mut self, job_id: Uuid, subscriber: mpsc::UnboundedSender<JobUpdate>) {
        let Phase::Working(active) = &mut self.state.phase else {
            self.replay_outcome(job_id, subscriber);
            return;
        };
        if active.job_id != job_id {
            self.replay_outcome(job_id, subscriber);
            return;
        }

        let id = active.next_subscriber_id;
        active.next_subscriber_id += 1;
        active.subscribers.insert(id, subscriber);
        debug!(job_id = %job_id, subscriber = id, "Subscriber added");

        if active.timer.is_none() {
            self.timer_generation += 1;
            let generation = self.timer_generation;
            let timer = PublishTimer::new(
                generation,
                PublishTimerConfig {
                    interval: self.config.publish_interval,
                },
                self.ticks_tx.clone(),
            );
            active.timer = Some(RunningTimer {
                generation,
                shutdown: timer.start(),
            });
        }
    }

    // Dropping `subscriber` without a message closes the caller's channel.
    fn replay_outcome(&self, job_id: Uuid, subscriber: mpsc::UnboundedSender<JobUpdate>) {
        match &self.state.last_outcome {
            Some((last_id, outcome)) if *last_id == job_id => {
                debug!(job_id = %job_id, "Replaying terminal update to late subscriber");
                let _ = subscriber.send(outcome.clone());
            }
            _ => debug!(job_id = %job_id, "Subscribe for unknown job, closing channel"),
        }
    }

    fn on_worker_reply(&mut self, reply: WorkerReply) {
        let user_attempts = self.config.user_attempts;
        let Phase::Working(active) = &mut self.state.phase else {
            debug!(job_id = %reply.job_id, "Worker reply while idle, ignoring");
            return;
        };
        if active.job_id != reply.job_id {
            debug!(job_id = %reply.job_id, "Worker reply for another job, ignoring");
            return;
        }

        let job_id = active.job_id;
        match reply.outcome {
            Ok(QueryOutput::Stargazers(users)) => {
                let count = u32::try_from(users.len()).unwrap_or(u32::MAX);
                info!(job_id = %job_id, stargazers = count, "Stargazer list received");
                active.stats = active.stats.with_expected_users(count);
                active.initial_list_received = true;

                for user in users {
                    self.dispatch(job_id, starred_query(user, user_attempts));
                }
            }
            Ok(QueryOutput::StarredRepos(listings)) => {
                active.index.record_user_stars(listings);
                active.stats = active.stats.user_completed();
            }
            Err(err) => self.on_query_failed(job_id, reply.query, err),
        }
    }

    fn on_query_failed(&mut self, job_id: Uuid, query: RetryableQuery, err: RemoteError) {
        let next = query.next_attempt();
        if err.is_retryable() && next.can_retry() {
            warn!(
                job_id = %job_id,
                query = %query.query,
                attempts_left = next.attempts_left(),
                error = %err,
                "Query failed, retrying"
            );
            self.dispatch(job_id, next);
            return;
        }

        if query.query.is_top_level() {
            error!(job_id = %job_id, query = %query.query, error = %err, "Job failed");
            self.finish_job(|active| JobUpdate::Failed {
                repo: active.repo.clone(),
            });
        } else if let Phase::Working(active) = &mut self.state.phase {
            warn!(job_id = %job_id, query = %query.query, error = %err, "Giving up on user");
            active.stats = active.stats.user_failed();
        }
    }

    fn on_publish_tick(&mut self, tick: PublishTick) {
        let Phase::Working(active) = &mut self.state.phase else {
            return;
        };
        let current = active.timer.as_ref().map(|timer| timer.generation);
        if current != Some(tick.generation) {
            debug!(generation = tick.generation, "Stale publish tick, ignoring");
            return;
        }

        if active.initial_list_received && active.stats.finished() {
            info!(
                job_id = %active.job_id,
                completed = active.stats.completed_user_count(),
                failed = active.stats.failed_user_count(),
                "Job completed"
            );
            self.finish_job(|active| JobUpdate::Completed {
                stats: active.stats,
                similar: active.index.ranking(&active.repo),
            });
        } else {
            let update = JobUpdate::Progress(active.stats);
            active.publish(&update);
        }
    }

    /// Push the terminal update, remember it and return to `Waiting`.
    ///
    /// Dropping the job stops its timer and closes every subscriber channel.
    fn finish_job(&mut self, outcome: impl FnOnce(&ActiveJob) -> JobUpdate) {
        let Phase::Working(mut active) = std::mem::take(&mut self.state.phase) else {
            return;
        };
        let update = outcome(&active);
        active.publish(&update);
        self.state.last_outcome = Some((active.job_id, update));
    }
}

fn starred_query(user: UserId, attempts: u32) -> RetryableQuery {
    RetryableQuery::new(Query::ListStarredRepos(user), attempts)
}

/// One unit of coordinator work, whichever channel it came from
enum Event {
    Mailbox(CoordinatorMsg),
    Worker(WorkerReply),
    Tick(PublishTick),
}
