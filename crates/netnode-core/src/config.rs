//! Static node configuration.
//!
//! The configuration is built once at startup and never mutated afterwards:
//! - Linux: loaded from a JSON file or assembled from CLI flags
//! - ESP32: assembled from build-time environment values
//!
//! Persisting configuration is out of scope; there is no storage backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Longest SSID the radio accepts, in bytes.
pub const MAX_SSID_LEN: usize = 32;
/// Shortest non-empty WPA passphrase, in bytes.
pub const MIN_CREDENTIAL_LEN: usize = 8;
/// Longest WPA passphrase, in bytes.
pub const MAX_CREDENTIAL_LEN: usize = 64;
/// Station limit of the soft-AP.
pub const MAX_AP_PEERS: u16 = 10;
/// Highest 2.4 GHz channel allowed for the soft-AP.
pub const MAX_AP_CHANNEL: u8 = 13;

/// Errors raised while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("network name cannot be empty")]
    EmptyNetworkName,

    #[error("network name is {0} bytes, at most 32 allowed")]
    NetworkNameTooLong(usize),

    #[error("credential is {0} bytes, expected empty or 8..=64")]
    CredentialLength(usize),

    #[error("channel {0} is outside 1..=13")]
    Channel(u8),

    #[error("max peers {0} is outside 1..=10")]
    MaxPeers(u16),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Radio operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceMode {
    /// Join an existing network (station mode).
    Client,
    /// Host a network other devices join.
    AccessPoint,
}

/// Link-layer authentication selected for the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Open,
    Wpa2Personal,
    Wpa3Personal,
}

impl AuthMethod {
    pub fn is_open(self) -> bool {
        self == AuthMethod::Open
    }
}

/// Wireless interface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceConfig {
    pub mode: InterfaceMode,

    /// SSID to join or to advertise.
    pub network_name: String,

    /// WPA passphrase (empty for an open network).
    #[serde(default)]
    pub credential: String,

    /// Radio channel. Zero lets a station use whatever the AP is on.
    #[serde(default = "default_channel")]
    pub channel: u8,

    /// Maximum number of associated stations (access-point mode only).
    #[serde(default = "default_max_peers")]
    pub max_peers: u16,

    /// Prefer WPA3-SAE for a secured access point.
    #[serde(default)]
    pub wpa3: bool,
}

fn default_channel() -> u8 {
    1
}

fn default_max_peers() -> u16 {
    4
}

impl InterfaceConfig {
    /// Station-mode config joining `network_name`.
    pub fn client(network_name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            mode: InterfaceMode::Client,
            network_name: network_name.into(),
            credential: credential.into(),
            channel: 0,
            max_peers: default_max_peers(),
            wpa3: false,
        }
    }

    /// Access-point config advertising `network_name`.
    pub fn access_point(
        network_name: impl Into<String>,
        credential: impl Into<String>,
        channel: u8,
        max_peers: u16,
    ) -> Self {
        Self {
            mode: InterfaceMode::AccessPoint,
            network_name: network_name.into(),
            credential: credential.into(),
            channel,
            max_peers,
            wpa3: false,
        }
    }

    /// Authentication implied by the credential.
    ///
    /// An empty credential always means an open network; anything else is
    /// secured.
    pub fn auth_method(&self) -> AuthMethod {
        if self.credential.is_empty() {
            AuthMethod::Open
        } else if self.wpa3 && self.mode == InterfaceMode::AccessPoint {
            AuthMethod::Wpa3Personal
        } else {
            AuthMethod::Wpa2Personal
        }
    }

    /// Check the limits the radio enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_name.is_empty() {
            return Err(ConfigError::EmptyNetworkName);
        }
        if self.network_name.len() > MAX_SSID_LEN {
            return Err(ConfigError::NetworkNameTooLong(self.network_name.len()));
        }

        let credential_len = self.credential.len();
        if credential_len != 0
            && !(MIN_CREDENTIAL_LEN..=MAX_CREDENTIAL_LEN).contains(&credential_len)
        {
            return Err(ConfigError::CredentialLength(credential_len));
        }

        if self.mode == InterfaceMode::AccessPoint {
            if !(1..=MAX_AP_CHANNEL).contains(&self.channel) {
                return Err(ConfigError::Channel(self.channel));
            }
            if !(1..=MAX_AP_PEERS).contains(&self.max_peers) {
                return Err(ConfigError::MaxPeers(self.max_peers));
            }
        } else if self.channel > MAX_AP_CHANNEL {
            return Err(ConfigError::Channel(self.channel));
        }

        Ok(())
    }
}

/// How the station call site waits for the network before its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReadyWait {
    /// Block until an address has been assigned, up to `timeout_ms`.
    #[serde(rename_all = "camelCase")]
    Signal { timeout_ms: u64 },
    /// Sleep for a flat delay and go ahead regardless.
    #[serde(rename_all = "camelCase")]
    FixedDelay { delay_ms: u64 },
}

impl ReadyWait {
    /// The two second sleep older firmware used.
    pub const LEGACY_DELAY: ReadyWait = ReadyWait::FixedDelay { delay_ms: 2000 };

    pub fn duration(&self) -> Duration {
        match *self {
            ReadyWait::Signal { timeout_ms } => Duration::from_millis(timeout_ms),
            ReadyWait::FixedDelay { delay_ms } => Duration::from_millis(delay_ms),
        }
    }
}

impl Default for ReadyWait {
    fn default() -> Self {
        ReadyWait::Signal { timeout_ms: 30_000 }
    }
}

/// Station-mode request settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSettings {
    /// Target of the one-shot GET.
    pub url: String,

    #[serde(default)]
    pub ready_wait: ReadyWait,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            url: "http://192.168.1.111:80/test".to_string(),
            ready_wait: ReadyWait::default(),
        }
    }
}

/// Command server settings (access-point mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandServerSettings {
    pub port: u16,

    /// Request bodies longer than this are truncated.
    pub max_body_bytes: usize,
}

impl Default for CommandServerSettings {
    fn default() -> Self {
        Self {
            port: 80,
            max_body_bytes: 100,
        }
    }
}

/// Digital output wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    /// GPIO number driving the LED.
    pub pin: u8,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { pin: 2 }
    }
}

/// Everything the node needs at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub interface: InterfaceConfig,

    #[serde(default)]
    pub station: StationSettings,

    #[serde(default)]
    pub server: CommandServerSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

impl NodeConfig {
    pub fn new(interface: InterfaceConfig) -> Self {
        Self {
            interface,
            station: StationSettings::default(),
            server: CommandServerSettings::default(),
            output: OutputSettings::default(),
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.interface.validate()?;
        Ok(config)
    }
}
