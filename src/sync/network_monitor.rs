//! # Network Monitor
//!
//! Translates low-level platform connectivity events into a stable online
//! boolean plus a one-shot "just reconnected" edge signal.
//!
//! ## Features
//!
//! - **Conjunction Rule**: online means "attached to a network" AND "that
//!   network actually reaches the internet" - a captive portal counts as
//!   offline
//! - **Snapshot Fan-out**: any number of observers watch the current state
//! - **Reconnect Edge**: delivered exactly once per offline-to-online
//!   transition to every subscriber, never on the first observation
//!
//! The monitor performs no I/O of its own; it is driven by a
//! [`ConnectivityProvider`] or by direct [`NetworkMonitor::apply`] calls.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch, RwLock};

/// Raw platform connectivity observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    /// Device is attached to a network (Wi-Fi association, cellular bearer)
    pub is_connected: bool,
    /// The attached network has an upstream route to the internet
    pub is_internet_reachable: bool,
}

impl LinkState {
    /// Attached with a working upstream route
    pub fn online() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: true,
        }
    }

    /// Not attached to any network
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: false,
        }
    }

    /// Attached but without internet reachability (captive portal, dead AP)
    pub fn captive() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: false,
        }
    }
}

/// Derived network state visible to the rest of the system.
///
/// Ephemeral, never persisted. `has_reconnected` is true only on the state
/// value delivered through the reconnect channel for the one notification
/// cycle following an offline-to-online transition; snapshots always carry
/// it cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkState {
    /// Conjunction of attachment and reachability
    pub is_online: bool,
    /// One-shot reconnect edge marker
    pub has_reconnected: bool,
}

/// Source of platform connectivity events
#[async_trait]
pub trait ConnectivityProvider: Send + Sync {
    /// Current connectivity snapshot
    async fn current(&self) -> LinkState;

    /// Stream of connectivity change events
    fn subscribe(&self) -> BoxStream<'static, LinkState>;
}

/// Connectivity state machine with snapshot and edge fan-out
#[derive(Debug)]
pub struct NetworkMonitor {
    state_tx: watch::Sender<NetworkState>,
    reconnect_tx: broadcast::Sender<NetworkState>,
    last_online: RwLock<Option<bool>>,
}

impl NetworkMonitor {
    /// Create a monitor with no prior observation
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(NetworkState::default());
        let (reconnect_tx, _) = broadcast::channel(16);
        Self {
            state_tx,
            reconnect_tx,
            last_online: RwLock::new(None),
        }
    }

    /// Feed one connectivity observation into the monitor.
    ///
    /// Returns the state for this notification cycle, with
    /// `has_reconnected` set when this observation completed an
    /// offline-to-online transition. The first observation after
    /// construction never counts as a reconnect.
    pub async fn apply(&self, link: LinkState) -> NetworkState {
        let is_online = link.is_connected && link.is_internet_reachable;

        let mut last = self.last_online.write().await;
        let previous = *last;
        *last = Some(is_online);
        drop(last);

        let has_reconnected = previous == Some(false) && is_online;
        let cycle_state = NetworkState {
            is_online,
            has_reconnected,
        };

        // Snapshots never carry the edge flag; it lives only on the value
        // delivered through the reconnect channel for this cycle.
        if previous != Some(is_online) {
            self.state_tx.send_replace(NetworkState {
                is_online,
                has_reconnected: false,
            });
        }

        if has_reconnected {
            tracing::info!("network: back online");
            let _ = self.reconnect_tx.send(cycle_state);
        } else if previous != Some(is_online) && !is_online {
            tracing::info!(
                is_connected = link.is_connected,
                is_internet_reachable = link.is_internet_reachable,
                "network: offline"
            );
        }

        cycle_state
    }

    /// Current state snapshot
    pub fn state(&self) -> NetworkState {
        *self.state_tx.borrow()
    }

    /// Watch the state snapshot (fan-out, one value per online/offline flip)
    pub fn watch(&self) -> watch::Receiver<NetworkState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to reconnect edges.
    ///
    /// Every subscriber receives exactly one value per offline-to-online
    /// transition.
    pub fn reconnects(&self) -> broadcast::Receiver<NetworkState> {
        self.reconnect_tx.subscribe()
    }

    /// Handle for late subscription to reconnect edges
    pub(crate) fn reconnect_sender(&self) -> broadcast::Sender<NetworkState> {
        self.reconnect_tx.clone()
    }

    /// Drive the monitor from a connectivity provider until its event
    /// stream ends.
    pub async fn run(&self, provider: &dyn ConnectivityProvider) {
        self.apply(provider.current().await).await;

        let mut events = provider.subscribe();
        while let Some(link) = events.next().await {
            self.apply(link).await;
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
