pub mod coordinator;
pub mod gatekeeper;
pub mod presenter;
pub mod publisher;
pub mod remote;
pub mod supervision;
pub mod system;
pub mod worker_pool;



pub use coordinator::{
    AdmissionReply, AdmissionTicket, CoordinatorHandle, CoordinatorMsg, JobCoordinator, JobHandle,
};
pub use gatekeeper::{
    Admission, DEFAULT_ADMISSION_TIMEOUT, GatekeeperHandle, GatekeeperMsg, JobGatekeeper,
    JobRequest, Replica, ReplicaFactory, coordinator_factory, spawn_gatekeeper,
};
pub use presenter::{
    ConsolePresenter, DEFAULT_TOP_RESULTS, PresentationEvent, format_progress, format_ranking,
};
pub use publisher::{DEFAULT_PUBLISH_INTERVAL, PublishTick, PublishTimer, PublishTimerConfig};
pub use remote::{QueryOutput, RemoteError, RemoteQueryClient};
pub use system::StargazerSystem;
pub use worker_pool::{DEFAULT_WORKER_POOL_SIZE, WorkItem, WorkerPool, WorkerReply};
