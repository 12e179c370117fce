//! Node configuration baked in at build time.
//!
//! The firmware has no filesystem to read a config file from, so the binary
//! captures `option_env!` values and hands them over as [`BuildEnv`].

use anyhow::{anyhow, bail, Context, Result};

use netnode_core::{InterfaceConfig, NodeConfig, ReadyWait};

/// Raw build-time settings; `None` means "use the default".
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildEnv {
    /// `station` or `ap`.
    pub mode: Option<&'static str>,
    pub ssid: Option<&'static str>,
    pub password: Option<&'static str>,
    pub channel: Option<&'static str>,
    pub max_peers: Option<&'static str>,
    /// Any non-empty value other than `0` enables WPA3 on the access point.
    pub wpa3: Option<&'static str>,
    pub url: Option<&'static str>,
    /// Fixed startup delay in milliseconds instead of waiting for an address.
    pub fixed_delay_ms: Option<&'static str>,
}

fn parse<T: std::str::FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|v| v.parse::<T>().with_context(|| format!("invalid {}: '{}'", name, v)))
        .transpose()
}

impl BuildEnv {
    pub fn node_config(&self) -> Result<NodeConfig> {
        let ssid = self.ssid.ok_or_else(|| anyhow!("WIFI_SSID not set at build time"))?;
        let password = self.password.unwrap_or("");

        let mut config = match self.mode.unwrap_or("station") {
            "station" => {
                let mut config = NodeConfig::new(InterfaceConfig::client(ssid, password));
                if let Some(url) = self.url {
                    config.station.url = url.to_string();
                }
                if let Some(delay_ms) = parse::<u64>("fixed delay", self.fixed_delay_ms)? {
                    config.station.ready_wait = ReadyWait::FixedDelay { delay_ms };
                }
                config
            }
            "ap" => {
                let channel = parse::<u8>("channel", self.channel)?.unwrap_or(1);
                let max_peers = parse::<u16>("max peers", self.max_peers)?.unwrap_or(4);
                let mut interface =
                    InterfaceConfig::access_point(ssid, password, channel, max_peers);
                interface.wpa3 = matches!(self.wpa3, Some(v) if !v.is_empty() && v != "0");
                NodeConfig::new(interface)
            }
            other => bail!("unknown mode '{}', expected 'station' or 'ap'", other),
        };

        config.interface.validate()?;
        config.output.pin = 2;
        Ok(config)
    }
}
