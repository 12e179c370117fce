//! netnode firmware for ESP32.
//!
//! This binary requires the ESP32 Rust toolchain.
//! It will not compile with the standard Rust toolchain.
//!
//! Settings are captured at build time:
//!
//! ```text
//! NETNODE_MODE=ap WIFI_SSID=ledserver WIFI_PASS=mypassword cargo build --release
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_svc::{hal::peripherals::Peripherals, log::EspLogger};
use log::{error, info, warn};

use netnode_core::{
    perform_get, wait_ready, EventDispatcher, InterfaceMode, NetworkInterfaceManager, NodeConfig,
    ReadinessGate, SharedOutput,
};
use netnode_esp32::{
    config::BuildEnv,
    http::{EspHttpConnector, EspServerLauncher},
    output::GpioOutput,
    wifi::EspRadio,
};
use netnode_protocol::CommandService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stack for the event control thread.
const CONTROL_STACK_SIZE: usize = 8 * 1024;

fn build_env() -> BuildEnv {
    BuildEnv {
        mode: option_env!("NETNODE_MODE"),
        ssid: option_env!("WIFI_SSID"),
        password: option_env!("WIFI_PASS"),
        channel: option_env!("AP_CHANNEL"),
        max_peers: option_env!("AP_MAX_CONN"),
        wpa3: option_env!("AP_WPA3"),
        url: option_env!("NETNODE_URL"),
        fixed_delay_ms: option_env!("NETNODE_FIXED_DELAY_MS"),
    }
}

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let config = build_env().node_config()?;
    let peripherals = Peripherals::take()?;
    let radio = EspRadio::new(peripherals.modem);

    info!("netnode starting in {:?} mode", config.interface.mode);

    match config.interface.mode {
        InterfaceMode::Client => run_station(config, radio),
        InterfaceMode::AccessPoint => {
            if config.output.pin != 2 {
                warn!("LED is wired to GPIO2; ignoring pin {}", config.output.pin);
            }
            let led = GpioOutput::new(2, peripherals.pins.gpio2.into())?;
            run_access_point(config, radio, Arc::new(led))
        }
    }
}

fn run_station(config: NodeConfig, radio: EspRadio) -> anyhow::Result<()> {
    let gate = Arc::new(ReadinessGate::new());
    let (manager, events) = NetworkInterfaceManager::initialize(radio, config.interface.clone())?;
    info!("wifi_init_sta finished.");

    let control = {
        let mut dispatcher = EventDispatcher::station(gate.clone());
        thread::Builder::new()
            .stack_size(CONTROL_STACK_SIZE)
            .spawn(move || events.run(&mut dispatcher))?
    };

    if wait_ready(&gate, config.station.ready_wait) {
        info!("WIFI was initiated ...........");
        let mut connector = EspHttpConnector::new(REQUEST_TIMEOUT);
        let result = perform_get(&mut connector, &config.station.url, |chunk| {
            info!("HTTP_EVENT_ON_DATA: {}", String::from_utf8_lossy(chunk));
        });
        match result {
            Ok(summary) => info!("HTTP GET status = {}", summary.status),
            Err(e) => error!("HTTP GET request failed: {}", e),
        }
    } else {
        warn!("Skipping GET {}: no network", config.station.url);
    }

    // Keep the radio up; the control thread keeps logging link changes.
    let _manager = manager;
    control
        .join()
        .map_err(|_| anyhow!("event thread panicked"))
}

fn run_access_point(
    config: NodeConfig,
    radio: EspRadio,
    led: SharedOutput,
) -> anyhow::Result<()> {
    let service = Arc::new(CommandService::new(led, config.server.max_body_bytes));
    let launcher = EspServerLauncher::new(config.server.port, service);

    let (_manager, events) =
        NetworkInterfaceManager::initialize(radio, config.interface.clone())?;
    info!(
        "wifi_init_softap finished. SSID:{} channel:{}",
        config.interface.network_name, config.interface.channel
    );

    // The server starts when the first station joins.
    let mut dispatcher = EventDispatcher::access_point(launcher);
    events.run(&mut dispatcher);
    Ok(())
}
