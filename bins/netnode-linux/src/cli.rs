use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use netnode_core::{InterfaceConfig, NodeConfig, ReadyWait};

#[derive(Parser, Debug, Clone)]
#[command(name = "netnode", about = "WiFi node: station GET or access-point LED server")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,

    /// Delay between simulated radio events, in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    pub link_delay_ms: u64,

    /// Peers that join the simulated access point
    #[arg(long, global = true, default_value_t = 1)]
    pub simulated_peers: u16,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Join a network and fetch one URL
    Station(StationOpts),
    /// Host a network and serve LED commands
    AccessPoint(AccessPointOpts),
    /// Run from a JSON configuration file
    Run(RunOpts),
}

#[derive(Args, Debug, Clone)]
pub struct StationOpts {
    /// Network to join
    #[arg(long)]
    pub ssid: String,
    /// Network password (empty for open networks)
    #[arg(long, default_value = "")]
    pub password: String,
    /// URL fetched once the node has an address
    #[arg(long, default_value = "http://192.168.1.111:80/test")]
    pub url: String,
    /// Give up waiting for an address after this many milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub wait_timeout_ms: u64,
    /// Sleep this long instead of waiting for the address event
    #[arg(long, conflicts_with = "wait_timeout_ms")]
    pub fixed_delay_ms: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct AccessPointOpts {
    /// Network name to advertise
    #[arg(long)]
    pub ssid: String,
    /// Network password (empty for an open network)
    #[arg(long, default_value = "")]
    pub password: String,
    #[arg(long, default_value_t = 1)]
    pub channel: u8,
    #[arg(long, default_value_t = 4)]
    pub max_peers: u16,
    /// Use WPA3 instead of WPA2 when a password is set
    #[arg(long, default_value_t = false)]
    pub wpa3: bool,
    /// Command server port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Request bodies longer than this are truncated
    #[arg(long, default_value_t = 100)]
    pub max_body_bytes: usize,
    /// GPIO number of the (simulated) LED
    #[arg(long, default_value_t = 2)]
    pub pin: u8,
}

#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    /// Path to a JSON node configuration
    #[arg(long)]
    pub config: PathBuf,
}

impl StationOpts {
    pub fn node_config(&self) -> NodeConfig {
        let mut config = NodeConfig::new(InterfaceConfig::client(&self.ssid, &self.password));
        config.station.url = self.url.clone();
        config.station.ready_wait = match self.fixed_delay_ms {
            Some(delay_ms) => ReadyWait::FixedDelay { delay_ms },
            None => ReadyWait::Signal {
                timeout_ms: self.wait_timeout_ms,
            },
        };
        config
    }
}

impl AccessPointOpts {
    pub fn node_config(&self) -> NodeConfig {
        let mut interface =
            InterfaceConfig::access_point(&self.ssid, &self.password, self.channel, self.max_peers);
        interface.wpa3 = self.wpa3;
        let mut config = NodeConfig::new(interface);
        config.server.port = self.port;
        config.server.max_body_bytes = self.max_body_bytes;
        config.output.pin = self.pin;
        config
    }
}

impl RunOpts {
    pub fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let text = std::fs::read_to_string(&self.config)
            .with_context(|| format!("reading {}", self.config.display()))?;
        NodeConfig::from_json(&text)
            .with_context(|| format!("parsing {}", self.config.display()))
    }
}

impl Cli {
    pub fn node_config(&self) -> anyhow::Result<NodeConfig> {
        match &self.cmd {
            Cmd::Station(opts) => Ok(opts.node_config()),
            Cmd::AccessPoint(opts) => Ok(opts.node_config()),
            Cmd::Run(opts) => opts.node_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netnode_core::InterfaceMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_station_args() {
        let cli = Cli::parse_from([
            "netnode",
            "station",
            "--ssid",
            "home",
            "--password",
            "secret123",
            "--fixed-delay-ms",
            "2000",
        ]);
        let config = cli.node_config().unwrap();

        assert_eq!(config.interface.mode, InterfaceMode::Client);
        assert_eq!(config.interface.network_name, "home");
        assert_eq!(config.station.ready_wait, ReadyWait::LEGACY_DELAY);
        assert_eq!(config.station.url, "http://192.168.1.111:80/test");
    }

    #[test]
    fn test_access_point_args() {
        let cli = Cli::parse_from([
            "netnode",
            "access-point",
            "--ssid",
            "ledserver",
            "--password",
            "mypassword",
            "--wpa3",
            "--simulated-peers",
            "3",
        ]);
        let config = cli.node_config().unwrap();

        assert_eq!(cli.simulated_peers, 3);
        assert_eq!(config.interface.mode, InterfaceMode::AccessPoint);
        assert!(config.interface.wpa3);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 100);
    }

    #[test]
    fn test_wait_options_conflict() {
        let parsed = Cli::try_parse_from([
            "netnode",
            "station",
            "--ssid",
            "home",
            "--wait-timeout-ms",
            "10",
            "--fixed-delay-ms",
            "10",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::parse_from(["netnode", "run", "--config", "/nonexistent/netnode.json"]);
        assert!(cli.node_config().is_err());
    }
}
