//! Process wiring
//!
//! Connects a remote client, the coordinator replicas, the gatekeeper and the
//! console presenter.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::gatekeeper::{spawn_gatekeeper, GatekeeperHandle};
use super::presenter::ConsolePresenter;
use super::remote::RemoteQueryClient;
use crate::config::Config;

/// A running system
pub struct StargazerSystem {
    pub gatekeeper: GatekeeperHandle,
    pub presenter: JoinHandle<()>,
}

impl StargazerSystem {
    /// Start every component against `client`.
    pub fn start(config: &Config, client: Arc<dyn RemoteQueryClient>) -> Self {
        let (presentation_tx, presentation_rx) = mpsc::unbounded_channel();
        let presenter = ConsolePresenter::new(config.top_results).spawn(presentation_rx);
        let gatekeeper = spawn_gatekeeper(config, client, presentation_tx);

        info!(
            replicas = config.coordinator_replicas,
            workers = config.worker_pool_size,
            "Stargazer system started"
        );
        Self {
            gatekeeper,
            presenter,
        }
    }
}
