//! # netnode-server
//!
//! Linux runtime for the netnode lifecycle core.
//!
//! This crate provides the host-side implementations of the core's seams:
//! - `server` - axum command server and its on-demand launcher
//! - `client` - blocking reqwest connector for the outbound GET
//! - `radio` - simulated radio driver emitting lifecycle events
//!
//! On ESP32 the same seams are implemented by `netnode-esp32`.

pub mod client;
pub mod radio;
pub mod server;

pub use client::ReqwestConnector;
pub use radio::SimulatedRadio;
pub use server::{command_router, HttpServerLauncher, ServerHandle};

pub use netnode_core::{EventDispatcher, NetworkInterfaceManager, ReadinessGate};
