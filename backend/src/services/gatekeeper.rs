//! Job gatekeeper
//!
//! Single entry point for job requests. Each request is negotiated against
//! every coordinator replica: the first replica that can take the job gets
//! it, and the request is rejected when every replica declines or the
//! admission timeout fires first. Requests arriving mid-negotiation wait in
//! a FIFO stash and are replayed once the gatekeeper is `Ready` again.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::coordinator::{
    AdmissionReply, AdmissionTicket, CoordinatorHandle, CoordinatorMsg, JobCoordinator, JobHandle,
};
use super::presenter::PresentationEvent;
use super::remote::RemoteQueryClient;
use super::supervision::supervise;
use crate::config::Config;
use crate::models::RepoKey;

/// Default time to wait for admission replies
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of a job submission
#[derive(Debug, Clone)]
pub enum Admission {
    Accepted(JobHandle),
    Rejected { repo: RepoKey },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// A submission waiting for its admission decision
#[derive(Debug)]
pub struct JobRequest {
    pub repo: RepoKey,
    pub requester: oneshot::Sender<Admission>,
}

impl JobRequest {
    fn reject(self) {
        debug!(repo = %self.repo, "Rejecting job request");
        let repo = self.repo;
        // The requester may have given up waiting; nothing to do then.
        let _ = self.requester.send(Admission::Rejected { repo });
    }
}

/// Messages accepted by the gatekeeper mailbox
#[derive(Debug)]
pub enum GatekeeperMsg {
    Submit(JobRequest),
    #[cfg(test)]
    Crash,
}

/// Cloneable address of the gatekeeper
///
/// Dropping every handle shuts the system down.
#[derive(Debug, Clone)]
pub struct GatekeeperHandle {
    tx: mpsc::UnboundedSender<GatekeeperMsg>,
}

impl GatekeeperHandle {
    /// Ask for `repo` to be analysed and wait for the decision.
    pub async fn submit(&self, repo: RepoKey) -> Admission {
        let (requester, decision) = oneshot::channel();
        let request = JobRequest {
            repo: repo.clone(),
            requester,
        };
        if self.tx.send(GatekeeperMsg::Submit(request)).is_err() {
            warn!(repo = %repo, "Gatekeeper has stopped, rejecting");
            return Admission::Rejected { repo };
        }
        decision.await.unwrap_or(Admission::Rejected { repo })
    }

    #[cfg(test)]
    pub(crate) fn send(&self, msg: GatekeeperMsg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// A coordinator replica owned by the gatekeeper
pub struct Replica {
    pub handle: CoordinatorHandle,
    task: Option<JoinHandle<()>>,
}

impl Replica {
    pub fn new(handle: CoordinatorHandle, task: JoinHandle<()>) -> Self {
        Self {
            handle,
            task: Some(task),
        }
    }

    /// A replica whose mailbox is driven by something other than a
    /// spawned coordinator.
    #[cfg(test)]
    pub(crate) fn detached(handle: CoordinatorHandle) -> Self {
        Self { handle, task: None }
    }

    fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Builds replica number `index`, both at startup and after a restart
pub type ReplicaFactory = Box<dyn Fn(usize) -> Replica + Send>;

/// Factory spawning real coordinators that share `client`.
pub fn coordinator_factory(config: &Config, client: Arc<dyn RemoteQueryClient>) -> ReplicaFactory {
    let config = config.clone();
    Box::new(move |_: usize| {
        let (handle, task) = JobCoordinator::spawn(&config, Arc::clone(&client));
        Replica::new(handle, task)
    })
}

struct Negotiation {
    id: u64,
    request: JobRequest,
    pending_replies: usize,
    timeout: JoinHandle<()>,
}

enum GatekeeperState {
    Ready,
    Negotiating(Negotiation),
}

/// The gatekeeper actor
pub struct JobGatekeeper {
    replica_count: usize,
    replicas: Vec<Replica>,
    factory: ReplicaFactory,
    presenter: mpsc::UnboundedSender<PresentationEvent>,
    replies_tx: mpsc::UnboundedSender<AdmissionReply>,
    timeouts_tx: mpsc::UnboundedSender<u64>,
    admission_timeout: Duration,
    next_negotiation_id: u64,
    state: GatekeeperState,
    stash: VecDeque<JobRequest>,
}

impl JobGatekeeper {
    /// Spawn the gatekeeper with `replica_count` replicas from `factory`.
    pub fn spawn(
        replica_count: usize,
        factory: ReplicaFactory,
        admission_timeout: Duration,
        presenter: mpsc::UnboundedSender<PresentationEvent>,
    ) -> (GatekeeperHandle, JoinHandle<()>) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (timeouts_tx, timeouts) = mpsc::unbounded_channel();

        let replicas = (0..replica_count).map(|i| factory(i)).collect();
        let gatekeeper = Self {
            replica_count,
            replicas,
            factory,
            presenter,
            replies_tx,
            timeouts_tx,
            admission_timeout,
            next_negotiation_id: 0,
            state: GatekeeperState::Ready,
            stash: VecDeque::new(),
        };
        let task = tokio::spawn(gatekeeper.run(mailbox, replies, timeouts));

        (GatekeeperHandle { tx }, task)
    }

    async fn run(
        mut self,
        mut mailbox: mpsc::UnboundedReceiver<GatekeeperMsg>,
        mut replies: mpsc::UnboundedReceiver<AdmissionReply>,
        mut timeouts: mpsc::UnboundedReceiver<u64>,
    ) {
        info!(replicas = self.replica_count, "Job gatekeeper started");

        loop {
            let event = tokio::select! {
                msg = mailbox.recv() => match msg {
                    Some(msg) => Event::Mailbox(msg),
                    None => break,
                },
                Some(reply) = replies.recv() => Event::Reply(reply),
                Some(negotiation_id) = timeouts.recv() => Event::Timeout(negotiation_id),
            };

            if let Err(panic) = supervise(|| self.handle(event)) {
                error!(panic = %panic, "Job gatekeeper crashed, restarting replicas");
                self.restart();
            }
        }

        info!("Job gatekeeper stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Mailbox(GatekeeperMsg::Submit(request)) => self.on_request(request),
            #[cfg(test)]
            Event::Mailbox(GatekeeperMsg::Crash) => panic!("gatekeeper crash requested"),
            Event::Reply(reply) => self.on_reply(reply),
            Event::Timeout(negotiation_id) => self.on_timeout(negotiation_id),
        }
    }

    fn on_request(&mut self, request: JobRequest) {
        if matches!(self.state, GatekeeperState::Negotiating(_)) {
            debug!(repo = %request.repo, queued = self.stash.len() + 1, "Negotiating, stashing request");
            self.stash.push_back(request);
            return;
        }
        self.negotiate(request);
    }

    fn negotiate(&mut self, request: JobRequest) {
        self.next_negotiation_id += 1;
        let id = self.next_negotiation_id;
        info!(negotiation_id = id, repo = %request.repo, "Negotiating job admission");

        let mut pending_replies = 0;
        for (replica, coordinator) in self.replicas.iter().enumerate() {
            let sent = coordinator.handle.send(CoordinatorMsg::CanAcceptJob {
                ticket: AdmissionTicket {
                    negotiation_id: id,
                    replica,
                },
                reply_to: self.replies_tx.clone(),
            });
            if sent {
                pending_replies += 1;
            } else {
                warn!(replica, "Replica mailbox closed, counting it as unable");
            }
        }

        if pending_replies == 0 {
            request.reject();
            return;
        }

        let timeouts = self.timeouts_tx.clone();
        let wait = self.admission_timeout;
        let timeout = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let _ = timeouts.send(id);
        });

        self.state = GatekeeperState::Negotiating(Negotiation {
            id,
            request,
            pending_replies,
            timeout,
        });
    }

    fn on_reply(&mut self, reply: AdmissionReply) {
        let GatekeeperState::Negotiating(negotiation) = &mut self.state else {
            debug!(negotiation_id = reply.ticket.negotiation_id, "Reply while ready, ignoring");
            return;
        };
        if negotiation.id != reply.ticket.negotiation_id {
            debug!(negotiation_id = reply.ticket.negotiation_id, "Stale admission reply, ignoring");
            return;
        }

        if reply.able {
            self.accept(reply.ticket.replica);
            return;
        }

        negotiation.pending_replies = negotiation.pending_replies.saturating_sub(1);
        if negotiation.pending_replies == 0 {
            info!(negotiation_id = negotiation.id, "Every replica is busy");
            self.reject_current();
        }
    }

    fn on_timeout(&mut self, negotiation_id: u64) {
        let current = matches!(
            &self.state,
            GatekeeperState::Negotiating(negotiation) if negotiation.id == negotiation_id
        );
        if current {
            warn!(negotiation_id, "Admission timed out");
            self.reject_current();
        } else {
            debug!(negotiation_id, "Stale admission timeout, ignoring");
        }
    }

    /// Leave `Negotiating`, cancelling its timeout.
    fn take_negotiation(&mut self) -> Option<Negotiation> {
        match std::mem::replace(&mut self.state, GatekeeperState::Ready) {
            GatekeeperState::Negotiating(negotiation) => {
                negotiation.timeout.abort();
                Some(negotiation)
            }
            GatekeeperState::Ready => None,
        }
    }

    fn accept(&mut self, replica: usize) {
        let Some(negotiation) = self.take_negotiation() else {
            return;
        };
        let request = negotiation.request;
        let Some(coordinator) = self.replicas.get(replica).map(|r| r.handle.clone()) else {
            error!(replica, "Able reply from unknown replica");
            request.reject();
            self.replay_stash();
            return;
        };

        let job = JobHandle::new(request.repo.clone(), coordinator.clone());
        info!(job_id = %job.job_id, repo = %request.repo, replica, "Job accepted");

        coordinator.send(CoordinatorMsg::BeginJob { job: job.clone() });
        if request.requester.send(Admission::Accepted(job.clone())).is_err() {
            debug!(repo = %request.repo, "Requester went away, job still begins");
        }
        if self.presenter.send(PresentationEvent::OpenResults { handle: job }).is_err() {
            debug!("Presentation layer is gone");
        }

        self.replay_stash();
    }

    fn reject_current(&mut self) {
        if let Some(negotiation) = self.take_negotiation() {
            negotiation.request.reject();
        }
        self.replay_stash();
    }

    /// Re-run stashed requests in arrival order until one starts a new
    /// negotiation.
    fn replay_stash(&mut self) {
        while matches!(self.state, GatekeeperState::Ready) {
            let Some(request) = self.stash.pop_front() else {
                break;
            };
            self.negotiate(request);
        }
    }

    /// Recover from a crashed handler: replace every replica, reject the
    /// request being negotiated and replay the stash against the fresh
    /// replicas.
    fn restart(&mut self) {
        for replica in &self.replicas {
            replica.abort();
        }
        self.replicas = (0..self.replica_count).map(|i| (self.factory)(i)).collect();

        if let Some(negotiation) = self.take_negotiation() {
            negotiation.request.reject();
        }
        if !self.stash.is_empty() {
            info!(queued = self.stash.len(), "Replaying stashed requests after restart");
        }
        self.replay_stash();
    }
}

enum Event {
    Mailbox(GatekeeperMsg),
    Reply(AdmissionReply),
    Timeout(u64),
}

/// Spawn a gatekeeper over `config.coordinator_replicas` real coordinators.
pub fn spawn_gatekeeper(
    config: &Config,
    client: Arc<dyn RemoteQueryClient>,
    presenter: mpsc::UnboundedSender<PresentationEvent>,
) -> GatekeeperHandle {
    let (handle, _task) = JobGatekeeper::spawn(
        config.coordinator_replicas,
        coordinator_factory(config, client),
        config.admission_timeout,
        presenter,
    );
    handle
}
