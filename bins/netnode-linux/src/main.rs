use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netnode_core::{
    perform_get, wait_ready, EventDispatcher, EventHandler, EventSource, InterfaceMode,
    MemoryOutput, NetworkInterfaceManager, NodeConfig, ReadinessGate, SharedOutput,
};
use netnode_protocol::CommandService;
use netnode_server::{HttpServerLauncher, ReqwestConnector, SimulatedRadio};

mod cli;

/// Timeout for the outbound GET.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,netnode_core=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = cli::Cli::parse();
    let config = args.node_config()?;
    let radio = SimulatedRadio::new()
        .with_link_delay(Duration::from_millis(args.link_delay_ms))
        .with_peers(args.simulated_peers);

    info!("netnode starting in {:?} mode", config.interface.mode);

    match config.interface.mode {
        InterfaceMode::Client => run_station(config, radio),
        InterfaceMode::AccessPoint => run_access_point(config, radio),
    }
}

/// Join the network, wait for an address, fetch the configured URL once.
fn run_station(config: NodeConfig, radio: SimulatedRadio) -> anyhow::Result<()> {
    let gate = Arc::new(ReadinessGate::new());
    let (manager, events) = NetworkInterfaceManager::initialize(radio, config.interface.clone())
        .context("WiFi initialization failed")?;
    info!("wifi_init_sta finished");

    let control = spawn_control(events, EventDispatcher::station(gate.clone()))?;

    if wait_ready(&gate, config.station.ready_wait) {
        info!("WIFI was initiated");
        fetch(&config.station.url);
    } else {
        warn!("Skipping GET {}: no network", config.station.url);
    }

    drop(manager);
    control
        .join()
        .map_err(|_| anyhow!("event thread panicked"))?;
    info!("Station finished");
    Ok(())
}

fn fetch(url: &str) {
    let mut connector = match ReqwestConnector::new(REQUEST_TIMEOUT) {
        Ok(connector) => connector,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };

    let result = perform_get(&mut connector, url, |chunk| {
        println!("HTTP_EVENT_ON_DATA: {}", String::from_utf8_lossy(chunk));
    });
    match result {
        Ok(summary) => info!("HTTP GET status = {}", summary.status),
        Err(e) => error!("HTTP GET request failed: {}", e),
    }
}

/// Host the network and serve LED commands until Ctrl+C.
fn run_access_point(config: NodeConfig, radio: SimulatedRadio) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    let led: SharedOutput = Arc::new(MemoryOutput::new(config.output.pin));
    let service = Arc::new(CommandService::new(led, config.server.max_body_bytes));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let launcher = HttpServerLauncher::new(addr, service, runtime.handle().clone());

    let (manager, events) = NetworkInterfaceManager::initialize(radio, config.interface.clone())
        .context("WiFi initialization failed")?;
    info!(
        "wifi_init_softap finished. SSID:{} channel:{} auth:{:?}",
        config.interface.network_name,
        config.interface.channel,
        config.interface.auth_method()
    );

    let control = spawn_control(events, EventDispatcher::access_point(launcher))?;

    info!("Server starts with the first station; try:");
    info!(
        "   curl -X POST -d '{{\"command\":\"ON\"}}' http://localhost:{}/led",
        config.server.port
    );

    runtime.block_on(tokio::signal::ctrl_c())?;
    info!("Received Ctrl+C, shutting down...");

    drop(manager);
    control
        .join()
        .map_err(|_| anyhow!("event thread panicked"))?;
    info!("Shutdown complete");
    Ok(())
}

/// Run the event control loop on its own thread.
fn spawn_control<H>(events: EventSource, mut handler: H) -> anyhow::Result<thread::JoinHandle<()>>
where
    H: EventHandler + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("wifi-events".into())
        .spawn(move || events.run(&mut handler))
        .context("spawning event thread")?;
    Ok(handle)
}
