//! ESP32 implementations of the netnode seams.
//!
//! - `wifi` - [`RadioDriver`](netnode_core::RadioDriver) over `EspWifi` and
//!   the system event loop
//! - `http` - command server launcher (`EspHttpServer`) and outbound
//!   connector (`EspHttpConnection`)
//! - `output` - LED on a GPIO pin
//! - `config` - node configuration baked in at build time
//!
//! The lifecycle logic itself lives in `netnode-core` and is identical to
//! the Linux build; only these adapters differ.

pub mod config;
pub mod http;
pub mod output;
pub mod wifi;
