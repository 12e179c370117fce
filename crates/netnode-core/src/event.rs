//! Lifecycle events and the channel that carries them.
//!
//! The radio driver pushes events through an [`EventSink`] from whatever
//! context its stack calls back on. A single control thread drains the
//! matching [`EventSource`] and hands each event, in arrival order, to an
//! [`EventHandler`]. Handlers therefore never run concurrently with
//! themselves.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::{debug, trace};

/// Association id the access point gives a peer.
pub type PeerId = u16;

/// Hardware address of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// Events reported by the network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The radio has started and is bringing the link up.
    InterfaceStarting,
    /// Station associated with the access point.
    LinkEstablished,
    /// Station lost its association.
    LinkLost,
    /// Station obtained an IP address.
    AddressAssigned,
    /// A peer associated with our access point.
    PeerJoined { peer_id: PeerId, mac: MacAddress },
    /// A peer left our access point.
    PeerLeft { peer_id: PeerId, mac: MacAddress },
}

/// Consumer of lifecycle events.
pub trait EventHandler {
    fn on_event(&mut self, event: LifecycleEvent);
}

/// Create a connected sink/source pair.
pub fn channel() -> (EventSink, EventSource) {
    let (tx, rx) = mpsc::channel();
    (EventSink { tx }, EventSource { rx })
}

/// Producer half, handed to the radio driver.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<LifecycleEvent>,
}

impl EventSink {
    /// Queue an event for the control thread.
    ///
    /// Returns `false` once the source has been dropped.
    pub fn emit(&self, event: LifecycleEvent) -> bool {
        trace!("Emitting {:?}", event);
        self.tx.send(event).is_ok()
    }
}

/// Consumer half, drained by the control thread.
#[derive(Debug)]
pub struct EventSource {
    rx: Receiver<LifecycleEvent>,
}

impl EventSource {
    /// Block for the next event. `None` once every sink is gone.
    pub fn next_event(&self) -> Option<LifecycleEvent> {
        self.rx.recv().ok()
    }

    /// Block for the next event, giving up after `timeout`.
    pub fn next_event_timeout(&self, timeout: Duration) -> Option<LifecycleEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Hand every already-queued event to `handler` without blocking.
    ///
    /// Returns the number of events delivered.
    pub fn dispatch_pending<H: EventHandler>(&self, handler: &mut H) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            handler.on_event(event);
            delivered += 1;
        }
        delivered
    }

    /// Run the control loop: deliver events until every sink is dropped.
    pub fn run<H: EventHandler>(self, handler: &mut H) {
        while let Some(event) = self.next_event() {
            handler.on_event(event);
        }
        debug!("Event source closed");
    }
}
