//! Network interface bring-up.
//!
//! [`NetworkInterfaceManager::initialize`] walks a [`RadioDriver`] through the
//! fixed bring-up sequence and returns the event stream the control thread
//! will drain. A radio that fails half-way through is not usable, so every
//! failure is fatal and reported with the step that failed.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, InterfaceConfig, InterfaceMode};
use crate::event::{self, EventSink, EventSource};

/// Error reported by a radio driver.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DriverError(String);

impl DriverError {
    pub fn new(message: impl fmt::Display) -> Self {
        DriverError(message.to_string())
    }
}

/// Stages of interface bring-up, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpStep {
    NetworkStack,
    EventLoop,
    Interface,
    Radio,
    Subscribe,
    Configure,
    Mode,
    Start,
    Connect,
}

impl fmt::Display for BringUpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BringUpStep::NetworkStack => "network stack init",
            BringUpStep::EventLoop => "event loop creation",
            BringUpStep::Interface => "interface creation",
            BringUpStep::Radio => "radio init",
            BringUpStep::Subscribe => "event subscription",
            BringUpStep::Configure => "configuration",
            BringUpStep::Mode => "mode activation",
            BringUpStep::Start => "start",
            BringUpStep::Connect => "connect",
        };
        f.write_str(name)
    }
}

/// Fatal interface initialization failure.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid interface configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("interface bring-up failed at {step}: {source}")]
    Step {
        step: BringUpStep,
        #[source]
        source: DriverError,
    },
}

impl InitError {
    /// The step that failed, if the config itself was fine.
    pub fn step(&self) -> Option<BringUpStep> {
        match self {
            InitError::InvalidConfig(_) => None,
            InitError::Step { step, .. } => Some(*step),
        }
    }
}

/// The radio and link-layer stack.
///
/// Implementations wrap the platform driver (ESP-IDF on hardware, a
/// simulation on hosts). Methods are called once each, in declaration order.
pub trait RadioDriver {
    fn init_network_stack(&mut self) -> Result<(), DriverError>;

    fn create_event_loop(&mut self) -> Result<(), DriverError>;

    /// Create the default network interface for `mode`.
    fn create_interface(&mut self, mode: InterfaceMode) -> Result<(), DriverError>;

    fn init_radio(&mut self) -> Result<(), DriverError>;

    /// Route every subsequent lifecycle event into `sink`.
    fn subscribe(&mut self, sink: EventSink) -> Result<(), DriverError>;

    /// Apply SSID, credential, auth method, channel and peer limit.
    fn apply_config(&mut self, config: &InterfaceConfig) -> Result<(), DriverError>;

    fn activate_mode(&mut self, mode: InterfaceMode) -> Result<(), DriverError>;

    fn start(&mut self) -> Result<(), DriverError>;

    /// Join the configured network. Only called in client mode.
    fn connect(&mut self) -> Result<(), DriverError>;
}

/// Owns an initialized radio for the lifetime of the process.
pub struct NetworkInterfaceManager<D> {
    driver: D,
    config: InterfaceConfig,
}

impl<D: RadioDriver> NetworkInterfaceManager<D> {
    /// Bring the interface up and return the event stream.
    ///
    /// The event sink is attached before the radio is configured or started,
    /// so no event can be missed.
    pub fn initialize(
        mut driver: D,
        config: InterfaceConfig,
    ) -> Result<(Self, EventSource), InitError> {
        config.validate()?;
        let mode = config.mode;
        let (sink, source) = event::channel();

        run_step(BringUpStep::NetworkStack, || driver.init_network_stack())?;
        run_step(BringUpStep::EventLoop, || driver.create_event_loop())?;
        run_step(BringUpStep::Interface, || driver.create_interface(mode))?;
        run_step(BringUpStep::Radio, || driver.init_radio())?;
        run_step(BringUpStep::Subscribe, || driver.subscribe(sink))?;
        run_step(BringUpStep::Configure, || driver.apply_config(&config))?;
        run_step(BringUpStep::Mode, || driver.activate_mode(mode))?;
        run_step(BringUpStep::Start, || driver.start())?;

        match mode {
            InterfaceMode::Client => {
                run_step(BringUpStep::Connect, || driver.connect())?;
                info!("Connecting to '{}'...", config.network_name);
            }
            InterfaceMode::AccessPoint => {
                info!(
                    "Access point up. SSID: {} auth: {:?} channel: {} max peers: {}",
                    config.network_name,
                    config.auth_method(),
                    config.channel,
                    config.max_peers
                );
            }
        }

        Ok((Self { driver, config }, source))
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

fn run_step(
    step: BringUpStep,
    action: impl FnOnce() -> Result<(), DriverError>,
) -> Result<(), InitError> {
    debug!("Bring-up: {}", step);
    action().map_err(|source| InitError::Step { step, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LifecycleEvent;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records the calls it receives and fails on request.
    struct ScriptedDriver {
        calls: Rc<RefCell<Vec<BringUpStep>>>,
        fail_at: Option<BringUpStep>,
        sink: Option<EventSink>,
    }

    impl ScriptedDriver {
        fn new(fail_at: Option<BringUpStep>) -> (Self, Rc<RefCell<Vec<BringUpStep>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let driver = Self {
                calls: calls.clone(),
                fail_at,
                sink: None,
            };
            (driver, calls)
        }

        fn record(&mut self, step: BringUpStep) -> Result<(), DriverError> {
            self.calls.borrow_mut().push(step);
            if self.fail_at == Some(step) {
                Err(DriverError::new("ESP_FAIL"))
            } else {
                Ok(())
            }
        }
    }

    impl RadioDriver for ScriptedDriver {
        fn init_network_stack(&mut self) -> Result<(), DriverError> {
            self.record(BringUpStep::NetworkStack)
        }

        fn create_event_loop(&mut self) -> Result<(), DriverError> {
            self.record(BringUpStep::EventLoop)
        }

        fn create_interface(&mut self, _mode: InterfaceMode) -> Result<(), DriverError> {
            self.record(BringUpStep::Interface)
        }

        fn init_radio(&mut self) -> Result<(), DriverError> {
            self.record(BringUpStep::Radio)
        }

        fn subscribe(&mut self, sink: EventSink) -> Result<(), DriverError> {
            self.sink = Some(sink);
            self.record(BringUpStep::Subscribe)
        }

        fn apply_config(&mut self, _config: &InterfaceConfig) -> Result<(), DriverError> {
            self.record(BringUpStep::Configure)
        }

        fn activate_mode(&mut self, _mode: InterfaceMode) -> Result<(), DriverError> {
            self.record(BringUpStep::Mode)
        }

        fn start(&mut self) -> Result<(), DriverError> {
            if let Some(sink) = &self.sink {
                sink.emit(LifecycleEvent::InterfaceStarting);
            }
            self.record(BringUpStep::Start)
        }

        fn connect(&mut self) -> Result<(), DriverError> {
            self.record(BringUpStep::Connect)
        }
    }

    const AP_STEPS: [BringUpStep; 8] = [
        BringUpStep::NetworkStack,
        BringUpStep::EventLoop,
        BringUpStep::Interface,
        BringUpStep::Radio,
        BringUpStep::Subscribe,
        BringUpStep::Configure,
        BringUpStep::Mode,
        BringUpStep::Start,
    ];

    #[test]
    fn test_client_bring_up_connects() {
        let (driver, calls) = ScriptedDriver::new(None);
        let config = InterfaceConfig::client("home", "password");

        let (manager, source) = NetworkInterfaceManager::initialize(driver, config).unwrap();

        let mut expected = AP_STEPS.to_vec();
        expected.push(BringUpStep::Connect);
        assert_eq!(*calls.borrow(), expected);
        assert_eq!(manager.config().network_name, "home");
        assert_eq!(
            source.next_event_timeout(std::time::Duration::ZERO),
            Some(LifecycleEvent::InterfaceStarting)
        );
    }

    #[test]
    fn test_access_point_bring_up_does_not_connect() {
        let (driver, calls) = ScriptedDriver::new(None);
        let config = InterfaceConfig::access_point("node", "", 1, 4);

        NetworkInterfaceManager::initialize(driver, config).unwrap();

        assert_eq!(*calls.borrow(), AP_STEPS.to_vec());
    }

    #[test]
    fn test_failed_step_stops_bring_up() {
        let (driver, calls) = ScriptedDriver::new(Some(BringUpStep::Radio));
        let config = InterfaceConfig::client("home", "");

        let err = NetworkInterfaceManager::initialize(driver, config)
            .err()
            .expect("bring-up should fail");

        assert_eq!(err.step(), Some(BringUpStep::Radio));
        assert_eq!(
            err.to_string(),
            "interface bring-up failed at radio init: ESP_FAIL"
        );
        assert_eq!(calls.borrow().last(), Some(&BringUpStep::Radio));
        assert_eq!(calls.borrow().len(), 4);
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let (driver, _calls) = ScriptedDriver::new(Some(BringUpStep::Connect));
        let config = InterfaceConfig::client("home", "");

        let err = NetworkInterfaceManager::initialize(driver, config)
            .err()
            .expect("bring-up should fail");
        assert_eq!(err.step(), Some(BringUpStep::Connect));
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let (driver, calls) = ScriptedDriver::new(None);
        let config = InterfaceConfig::client("", "");

        let err = NetworkInterfaceManager::initialize(driver, config)
            .err()
            .expect("config should be rejected");

        assert!(matches!(
            err,
            InitError::InvalidConfig(ConfigError::EmptyNetworkName)
        ));
        assert!(calls.borrow().is_empty());
    }
}
