//! Simulated radio for hosts without WiFi hardware.
//!
//! Follows the [`RadioDriver`] contract and produces the same event
//! sequences the ESP-IDF driver does:
//! - Client: `InterfaceStarting` on start, then `LinkEstablished` and
//!   `AddressAssigned` after the link delay once `connect` is called
//! - Access point: `InterfaceStarting` on start, then one `PeerJoined` per
//!   simulated peer, spaced by the link delay

use std::thread;
use std::time::Duration;

use netnode_core::{
    BringUpStep, DriverError, EventSink, InterfaceConfig, InterfaceMode, LifecycleEvent,
    MacAddress, PeerId, RadioDriver,
};
use tracing::{debug, info};

/// Espressif OUI used for simulated peer addresses.
const SIMULATED_OUI: [u8; 3] = [0x24, 0x6f, 0x28];

/// Host-side stand-in for the WiFi driver.
pub struct SimulatedRadio {
    link_delay: Duration,
    peers: Vec<(PeerId, MacAddress)>,
    fail_at: Option<BringUpStep>,
    mode: Option<InterfaceMode>,
    config: Option<InterfaceConfig>,
    sink: Option<EventSink>,
    started: bool,
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadio {
    pub fn new() -> Self {
        Self {
            link_delay: Duration::from_millis(500),
            peers: Vec::new(),
            fail_at: None,
            mode: None,
            config: None,
            sink: None,
            started: false,
        }
    }

    /// Delay between simulated link events.
    pub fn with_link_delay(mut self, delay: Duration) -> Self {
        self.link_delay = delay;
        self
    }

    /// Peers that associate after an access point starts.
    pub fn with_peers(mut self, count: u16) -> Self {
        self.peers = (1..=count).map(simulated_peer).collect();
        self
    }

    /// Fail the given bring-up step.
    pub fn failing_at(mut self, step: BringUpStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Configuration applied during bring-up.
    pub fn config(&self) -> Option<&InterfaceConfig> {
        self.config.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Simulate the station losing its association.
    pub fn drop_link(&self) {
        self.emit(LifecycleEvent::LinkLost);
    }

    /// Simulate a peer leaving the access point.
    pub fn disconnect_peer(&self, peer_id: PeerId) {
        let mac = simulated_peer(peer_id).1;
        self.emit(LifecycleEvent::PeerLeft { peer_id, mac });
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }

    fn check(&self, step: BringUpStep) -> Result<(), DriverError> {
        debug!("Simulated radio: {}", step);
        if self.fail_at == Some(step) {
            Err(DriverError::new(format!("simulated failure during {}", step)))
        } else {
            Ok(())
        }
    }

    fn sink(&self) -> Result<EventSink, DriverError> {
        self.sink
            .clone()
            .ok_or_else(|| DriverError::new("no event subscriber"))
    }
}

fn simulated_peer(peer_id: PeerId) -> (PeerId, MacAddress) {
    let [hi, lo] = peer_id.to_be_bytes();
    let [a, b, c] = SIMULATED_OUI;
    (peer_id, MacAddress([a, b, c, 0x00, hi, lo]))
}

impl RadioDriver for SimulatedRadio {
    fn init_network_stack(&mut self) -> Result<(), DriverError> {
        self.check(BringUpStep::NetworkStack)
    }

    fn create_event_loop(&mut self) -> Result<(), DriverError> {
        self.check(BringUpStep::EventLoop)
    }

    fn create_interface(&mut self, mode: InterfaceMode) -> Result<(), DriverError> {
        self.check(BringUpStep::Interface)?;
        self.mode = Some(mode);
        Ok(())
    }

    fn init_radio(&mut self) -> Result<(), DriverError> {
        self.check(BringUpStep::Radio)
    }

    fn subscribe(&mut self, sink: EventSink) -> Result<(), DriverError> {
        self.check(BringUpStep::Subscribe)?;
        self.sink = Some(sink);
        Ok(())
    }

    fn apply_config(&mut self, config: &InterfaceConfig) -> Result<(), DriverError> {
        self.check(BringUpStep::Configure)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn activate_mode(&mut self, mode: InterfaceMode) -> Result<(), DriverError> {
        self.check(BringUpStep::Mode)?;
        if self.mode != Some(mode) {
            return Err(DriverError::new(format!(
                "no {:?} interface has been created",
                mode
            )));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), DriverError> {
        self.check(BringUpStep::Start)?;
        let sink = self.sink()?;
        self.started = true;
        sink.emit(LifecycleEvent::InterfaceStarting);

        if self.mode == Some(InterfaceMode::AccessPoint) && !self.peers.is_empty() {
            let peers = self.peers.clone();
            let delay = self.link_delay;
            thread::spawn(move || {
                for (peer_id, mac) in peers {
                    thread::sleep(delay);
                    if !sink.emit(LifecycleEvent::PeerJoined { peer_id, mac }) {
                        break;
                    }
                }
            });
        }
        Ok(())
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        self.check(BringUpStep::Connect)?;
        if !self.started {
            return Err(DriverError::new("radio not started"));
        }
        let sink = self.sink()?;
        let delay = self.link_delay;
        if let Some(config) = &self.config {
            info!("Simulating association with '{}'", config.network_name);
        }
        thread::spawn(move || {
            thread::sleep(delay);
            if sink.emit(LifecycleEvent::LinkEstablished) {
                thread::sleep(delay);
                sink.emit(LifecycleEvent::AddressAssigned);
            }
        });
        Ok(())
    }
}
