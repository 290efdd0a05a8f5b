// src/connectivity/mod.rs

pub mod poller;
pub mod probe;
pub mod status;
pub mod store;

pub use poller::{HealthPoller, DEFAULT_POLL_INTERVAL};
pub use probe::HealthProbe;
pub use status::{EngineStatus, EngineStatusView};
pub use store::{ConnectivityState, ConnectivityStore, Listener, Subscription, DEFAULT_CHECK_TIMEOUT};
