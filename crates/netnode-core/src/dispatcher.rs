//! Lifecycle event dispatcher.
//!
//! Maps interface events to side effects:
//! - Client mode: track the link and open the readiness gate on address
//!   assignment
//! - Access-point mode: track peers and start the command server on the
//!   first association
//!
//! The dispatcher is the only writer of the server handle, and it is driven
//! from a single control thread, so the start-once transition needs no
//! further locking.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::InterfaceMode;
use crate::event::{EventHandler, LifecycleEvent, MacAddress, PeerId};
use crate::readiness::ReadinessGate;

/// Failure to start the command server.
#[derive(Debug, Error)]
pub enum StartServerError {
    #[error("failed to bind command server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("failed to start command server: {0}")]
    Runtime(String),

    #[error("no command server available in this mode")]
    Unsupported,
}

/// Starts the command server on demand.
pub trait ServerLauncher {
    /// Keeps the running server alive.
    type Handle;

    fn start(&mut self) -> Result<Self::Handle, StartServerError>;
}

/// Launcher for nodes that never serve (station mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoServer;

impl ServerLauncher for NoServer {
    type Handle = Infallible;

    fn start(&mut self) -> Result<Self::Handle, StartServerError> {
        Err(StartServerError::Unsupported)
    }
}

/// Station link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Not connected to any network.
    Disconnected,
    /// Radio started, association in progress.
    Connecting,
    /// Associated but waiting for IP.
    WaitingForIp,
    /// Fully connected with IP address.
    Connected,
}

/// Routes lifecycle events for one interface.
pub struct EventDispatcher<L: ServerLauncher> {
    mode: InterfaceMode,
    ready: Arc<ReadinessGate>,
    launcher: L,
    server: Option<L::Handle>,
    link: LinkStatus,
    peers: BTreeMap<PeerId, MacAddress>,
}

impl EventDispatcher<NoServer> {
    /// Dispatcher for a station that only needs the readiness signal.
    pub fn station(ready: Arc<ReadinessGate>) -> Self {
        Self::new(InterfaceMode::Client, ready, NoServer)
    }
}

impl<L: ServerLauncher> EventDispatcher<L> {
    pub fn new(mode: InterfaceMode, ready: Arc<ReadinessGate>, launcher: L) -> Self {
        Self {
            mode,
            ready,
            launcher,
            server: None,
            link: LinkStatus::Disconnected,
            peers: BTreeMap::new(),
        }
    }

    /// Dispatcher for an access point that serves commands.
    pub fn access_point(launcher: L) -> Self {
        Self::new(
            InterfaceMode::AccessPoint,
            Arc::new(ReadinessGate::new()),
            launcher,
        )
    }

    pub fn mode(&self) -> InterfaceMode {
        self.mode
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    /// The running command server, if it has been started.
    pub fn server(&self) -> Option<&L::Handle> {
        self.server.as_ref()
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Peers currently associated with the access point.
    pub fn peers(&self) -> impl Iterator<Item = (PeerId, MacAddress)> + '_ {
        self.peers.iter().map(|(id, mac)| (*id, *mac))
    }

    fn on_client_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::InterfaceStarting => {
                info!("WiFi connecting...");
                self.link = LinkStatus::Connecting;
            }
            LifecycleEvent::LinkEstablished => {
                info!("WiFi connected, waiting for DHCP lease...");
                self.link = LinkStatus::WaitingForIp;
            }
            LifecycleEvent::LinkLost => {
                warn!("WiFi lost connection");
                self.link = LinkStatus::Disconnected;
            }
            LifecycleEvent::AddressAssigned => {
                info!("WiFi got IP");
                self.link = LinkStatus::Connected;
                if !self.ready.signal() {
                    debug!("Readiness already signalled");
                }
            }
            other => debug!("Ignoring {:?} in client mode", other),
        }
    }

    fn on_access_point_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::PeerJoined { peer_id, mac } => {
                info!("Station {} join, AID={}", mac, peer_id);
                self.peers.insert(peer_id, mac);
                self.ensure_server();
            }
            LifecycleEvent::PeerLeft { peer_id, mac } => {
                info!("Station {} leave, AID={}", mac, peer_id);
                self.peers.remove(&peer_id);
            }
            LifecycleEvent::InterfaceStarting => info!("Access point starting"),
            other => debug!("Ignoring {:?} in access-point mode", other),
        }
    }

    /// Start the command server unless it is already running.
    fn ensure_server(&mut self) {
        if self.server.is_some() {
            return;
        }
        info!("Starting command server");
        match self.launcher.start() {
            Ok(handle) => self.server = Some(handle),
            // Left unset: the next association retries.
            Err(e) => error!("Error starting server: {}", e),
        }
    }
}

impl<L: ServerLauncher> EventHandler for EventDispatcher<L> {
    fn on_event(&mut self, event: LifecycleEvent) {
        match self.mode {
            InterfaceMode::Client => self.on_client_event(event),
            InterfaceMode::AccessPoint => self.on_access_point_event(event),
        }
    }
}
