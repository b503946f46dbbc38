//! Bounded worker pool
//!
//! A fixed set of stateless worker tasks, each with its own mailbox and
//! running one query at a time. Workers never retry: every outcome, including
//! a panic inside the client, goes back to whoever submitted the work.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::remote::{QueryOutput, RemoteError, RemoteQueryClient};
use super::supervision::panic_message;
use crate::models::RetryableQuery;

/// Default number of workers per coordinator
pub const DEFAULT_WORKER_POOL_SIZE: usize = 10;

/// A query to run on behalf of one job
#[derive(Debug)]
pub struct WorkItem {
    pub job_id: Uuid,
    pub query: RetryableQuery,
    pub reply_to: mpsc::UnboundedSender<WorkerReply>,
}

/// What a worker reports back for a [`WorkItem`]
#[derive(Debug, Clone)]
pub struct WorkerReply {
    pub job_id: Uuid,
    pub query: RetryableQuery,
    pub outcome: Result<QueryOutput, RemoteError>,
}

/// Round-robin dispatcher over a fixed set of workers
pub struct WorkerPool {
    workers: Vec<mpsc::UnboundedSender<WorkItem>>,
    next: usize,
}

impl WorkerPool {
    /// Spawn `size` workers sharing `client`. A size of zero still gets one
    /// worker; configuration rejects it before it reaches here.
    pub fn spawn(size: usize, client: Arc<dyn RemoteQueryClient>) -> Self {
        let workers = (0..size.max(1))
            .map(|id| {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(run_worker(id, Arc::clone(&client), rx));
                tx
            })
            .collect();

        Self { workers, next: 0 }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Hand `item` to the next worker in turn.
    pub fn submit(&mut self, item: WorkItem) {
        let worker = self.next;
        self.next = (self.next + 1) % self.workers.len();

        debug!(worker, job_id = %item.job_id, query = %item.query.query, "Dispatching query");
        if let Err(rejected) = self.workers[worker].send(item) {
            // Worker tasks only end when the pool is dropped.
            warn!(worker, query = %rejected.0.query.query, "Worker mailbox closed, query dropped");
        }
    }
}

async fn run_worker(
    id: usize,
    client: Arc<dyn RemoteQueryClient>,
    mut mailbox: mpsc::UnboundedReceiver<WorkItem>,
) {
    while let Some(item) = mailbox.recv().await {
        let outcome = AssertUnwindSafe(client.execute(&item.query.query))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(&*payload);
                warn!(worker = id, query = %item.query.query, panic = %message, "Query panicked");
                Err(RemoteError::Transient(format!("worker panicked: {message}")))
            });

        let reply = WorkerReply {
            job_id: item.job_id,
            query: item.query,
            outcome,
        };
        if item.reply_to.send(reply).is_err() {
            debug!(worker = id, "Reply dropped, dispatcher is gone");
        }
    }
    debug!(worker = id, "Worker stopped");
}
