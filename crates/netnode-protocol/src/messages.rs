//! Message types for the `/led` endpoint.
//!
//! - Client → Server: `{"command": "ON" | "OFF" | ...}`
//! - Server → Client: `{"message": "..."}`, or a plain-text body for
//!   commands it does not know

use serde::{Deserialize, Serialize};

/// Path of the command endpoint.
pub const LED_PATH: &str = "/led";

/// Name of the request field carrying the command.
pub const COMMAND_FIELD: &str = "command";

/// Reply body for ON.
pub const LED_ON_MESSAGE: &str = "LED is turned on";

/// Reply body for OFF.
pub const LED_OFF_MESSAGE: &str = "LED is turned off";

/// Plain-text reply for commands other than ON/OFF.
pub const INVALID_COMMAND: &str = "Invalid command";

/// Plain-text reply for bodies that are not JSON.
pub const INVALID_PAYLOAD: &str = "Invalid payload";

/// Plain-text reply when the body could not be received.
pub const READ_FAILED: &str = "Failed to read request";

/// Plain-text reply when the LED could not be driven.
pub const OUTPUT_FAILED: &str = "Failed to set LED";

/// Decoded LED command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
    /// Anything else, including a missing or non-string field (empty).
    Unrecognized(String),
}

impl Command {
    /// Interpret the raw `command` value. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ON" => Command::On,
            "OFF" => Command::Off,
            other => Command::Unrecognized(other.to_string()),
        }
    }

    /// Wire form of the command.
    pub fn as_str(&self) -> &str {
        match self {
            Command::On => "ON",
            Command::Off => "OFF",
            Command::Unrecognized(raw) => raw,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

impl CommandRequest {
    pub fn new(command: &Command) -> Self {
        Self {
            command: command.as_str().to_string(),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub message: String,
}

impl CommandResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
