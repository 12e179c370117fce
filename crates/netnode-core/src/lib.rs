//! # netnode-core
//!
//! Connection lifecycle core for a small wireless node.
//!
//! This crate provides:
//! - Static node configuration (interface, station, server, output)
//! - Lifecycle events and the channel that carries them
//! - Interface bring-up over an abstract radio driver
//! - The event dispatcher that gates dependent services on readiness
//! - The outbound request client over an abstract HTTP connector
//! - The digital output abstraction
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and ESP32 (esp-idf) targets.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod interface;
pub mod output;
pub mod readiness;

pub use client::{perform_get, ConnectError, GetSummary, HttpConnector, ResponseBody};
pub use config::{
    AuthMethod, CommandServerSettings, ConfigError, InterfaceConfig, InterfaceMode, NodeConfig,
    OutputSettings, ReadyWait, StationSettings,
};
pub use dispatcher::{EventDispatcher, LinkStatus, NoServer, ServerLauncher, StartServerError};
pub use event::{EventHandler, EventSink, EventSource, LifecycleEvent, MacAddress, PeerId};
pub use interface::{BringUpStep, DriverError, InitError, NetworkInterfaceManager, RadioDriver};
pub use output::{DigitalOutput, Level, MemoryOutput, OutputError, SharedOutput};
pub use readiness::{wait_ready, ReadinessGate};
