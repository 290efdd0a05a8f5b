// src/connectivity/status.rs

use crate::connectivity::{ConnectivityState, ConnectivityStore, Subscription};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// What presentation code renders for the Engine status badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatusView {
    pub is_online: bool,
    /// True while at least one manual check is running
    pub loading: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Binds a [`ConnectivityStore`] to presentation code.
///
/// Mirrors every store notification into a `watch` channel and adds a
/// `loading` flag around manual checks. Automatic poller checks never touch
/// `loading`.
pub struct EngineStatus {
    store: Arc<ConnectivityStore>,
    view: Arc<watch::Sender<EngineStatusView>>,
    manual_in_flight: Arc<AtomicUsize>,
    subscription: Subscription,
}

impl EngineStatus {
    pub fn activate(store: Arc<ConnectivityStore>) -> Self {
        let current = store.state();
        let (tx, _rx) = watch::channel(EngineStatusView {
            is_online: current.is_online,
            loading: false,
            last_checked_at: current.last_checked_at,
        });
        let view = Arc::new(tx);

        let listener_view = view.clone();
        let subscription = store.subscribe(move |state: &ConnectivityState| {
            listener_view.send_modify(|view| {
                view.is_online = state.is_online;
                view.last_checked_at = state.last_checked_at;
            });
        });

        debug!(listener.id = subscription.id(), "Engine status activated");

        Self {
            store,
            view,
            manual_in_flight: Arc::new(AtomicUsize::new(0)),
            subscription,
        }
    }

    pub fn is_online(&self) -> bool {
        self.view.borrow().is_online
    }

    pub fn loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn view(&self) -> EngineStatusView {
        *self.view.borrow()
    }

    /// Receiver that wakes on every store notification and loading change.
    pub fn watch(&self) -> watch::Receiver<EngineStatusView> {
        self.view.subscribe()
    }

    /// Runs one manual health check.
    ///
    /// `loading` turns true as soon as this is called, before the returned
    /// future is polled, and turns false once the check settles, whatever the
    /// outcome. Dropping the future without awaiting it also clears it.
    pub fn check_system(&self) -> impl Future<Output = ConnectivityState> + Send + 'static {
        let guard = LoadingGuard::begin(self.manual_in_flight.clone(), self.view.clone());
        let store = self.store.clone();

        async move {
            let _guard = guard;
            store.check_health().await
        }
    }

    /// Tears down the store subscription.
    pub fn deactivate(self) {
        drop(self);
    }
}

impl Drop for EngineStatus {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        debug!(listener.id = self.subscription.id(), "Engine status deactivated");
    }
}

struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
    view: Arc<watch::Sender<EngineStatusView>>,
}

impl LoadingGuard {
    fn begin(in_flight: Arc<AtomicUsize>, view: Arc<watch::Sender<EngineStatusView>>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self::publish(&in_flight, &view);
        Self { in_flight, view }
    }

    // Recomputed under the channel lock so overlapping checks settle on the
    // right value regardless of interleaving.
    fn publish(in_flight: &AtomicUsize, view: &watch::Sender<EngineStatusView>) {
        view.send_modify(|view| view.loading = in_flight.load(Ordering::SeqCst) > 0);
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Self::publish(&self.in_flight, &self.view);
    }
}
