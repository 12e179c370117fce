//! # netnode-protocol
//!
//! Command protocol for the `/led` endpoint.
//!
//! This crate defines the request and response payloads, their JSON codec,
//! and the framework-agnostic request handling shared by the axum server on
//! Linux and the ESP-IDF server on ESP32.

pub mod codec;
pub mod handler;
pub mod messages;

pub use codec::{decode_payload, encode_request, encode_response, CommandPayload, DecodeError};
pub use handler::{BodyBuffer, CommandService, ReadError, Reply};
pub use messages::*;
