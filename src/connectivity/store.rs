// src/connectivity/store.rs

use crate::connectivity::HealthProbe;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Last known reachability of the Engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityState {
    pub is_online: bool,
    /// When the most recent check resolved; `None` until the first one does
    pub last_checked_at: Option<DateTime<Utc>>,
    pub checks_completed: u64,
}

pub type Listener = Arc<dyn Fn(&ConnectivityState) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl ListenerRegistry {
    fn insert(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }
}

/// Handle returned by [`ConnectivityStore::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this listener. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.lock().remove(self.id) {
                debug!(listener.id = self.id, "Connectivity listener removed");
            }
        }
    }
}

/// Holds the Engine connectivity flag and fans out every check result.
///
/// Listeners are notified after *every* resolved check, not only when
/// `is_online` flips, in registration order and before `check_health`
/// returns.
pub struct ConnectivityStore {
    probe: Arc<dyn HealthProbe>,
    check_timeout: Duration,
    state: Mutex<ConnectivityState>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    // Serializes "write state + notify" so listeners see results in the
    // same order the state was written.
    round: Mutex<()>,
}

impl ConnectivityStore {
    pub fn new(probe: Arc<dyn HealthProbe>, check_timeout: Duration) -> Self {
        Self {
            probe,
            check_timeout,
            state: Mutex::new(ConnectivityState::default()),
            listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
            round: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.lock().clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.lock().is_online
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_checked_at
    }

    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        let id = self.listeners.lock().insert(Arc::new(listener));
        debug!(listener.id = id, "Connectivity listener registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Probes the Engine once and records the outcome.
    ///
    /// Never fails: errors, timeouts and probe panics mark the Engine
    /// offline. No retry is attempted here. Returns the state this check produced.
    pub async fn check_health(&self) -> ConnectivityState {
        let started = Instant::now();
        let probe = AssertUnwindSafe(self.probe.probe()).catch_unwind();
        let outcome = match tokio::time::timeout(self.check_timeout, probe).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                error!(engine.target = %self.probe.target(), "Health probe panicked");
                Err(AppError::internal("health probe panicked"))
            }
            Err(_) => Err(AppError::RequestTimeout {
                timeout_ms: self.check_timeout.as_millis() as u64,
            }),
        };
        let elapsed = started.elapsed();

        let _round = self.round.lock();
        let (was_online, snapshot) = {
            let mut state = self.state.lock();
            let was_online = state.is_online;
            state.is_online = outcome.is_ok();
            state.last_checked_at = Some(Utc::now());
            state.checks_completed += 1;
            (was_online, state.clone())
        };

        let target = self.probe.target();
        match (&outcome, was_online) {
            (Ok(()), false) => {
                info!(engine.target = %target, elapsed = ?elapsed, "Engine is back online");
            }
            (Err(e), true) => {
                warn!(engine.target = %target, error = %e, elapsed = ?elapsed, "Engine went offline");
            }
            (Ok(()), true) => {
                debug!(engine.target = %target, elapsed = ?elapsed, "Engine still online");
            }
            (Err(e), false) => {
                debug!(engine.target = %target, error = %e, elapsed = ?elapsed, "Engine still offline");
            }
        }

        self.notify(&snapshot);
        snapshot
    }

    fn notify(&self, state: &ConnectivityState) {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Vec<(u64, Listener)> = self.listeners.lock().entries.clone();

        for (id, listener) in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
                error!(listener.id = id, "Connectivity listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for ConnectivityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityStore")
            .field("target", &self.probe.target())
            .field("check_timeout", &self.check_timeout)
            .field("state", &*self.state.lock())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
