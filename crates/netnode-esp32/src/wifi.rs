//! WiFi radio driver for ESP32.
//!
//! Wraps a non-blocking `EspWifi` so bring-up is driven step by step by
//! [`NetworkInterfaceManager`](netnode_core::NetworkInterfaceManager) and
//! every WiFi/IP event is forwarded to the core's event channel.

use esp_idf_svc::{
    eventloop::{EspSubscription, EspSystemEventLoop, System},
    hal::modem::Modem,
    netif::IpEvent,
    nvs::EspDefaultNvsPartition,
    wifi::{
        AccessPointConfiguration, AuthMethod as EspAuthMethod, ClientConfiguration,
        Configuration, EspWifi, WifiEvent,
    },
};
use log::{debug, info};

use netnode_core::{
    AuthMethod, DriverError, EventSink, InterfaceConfig, InterfaceMode, LifecycleEvent,
    MacAddress, RadioDriver,
};

/// [`RadioDriver`] backed by the ESP-IDF WiFi driver.
pub struct EspRadio {
    modem: Option<Modem>,
    nvs: Option<EspDefaultNvsPartition>,
    sysloop: Option<EspSystemEventLoop>,
    wifi: Option<EspWifi<'static>>,
    mode: Option<InterfaceMode>,
    subscriptions: Vec<EspSubscription<'static, System>>,
}

impl EspRadio {
    pub fn new(modem: Modem) -> Self {
        Self {
            modem: Some(modem),
            nvs: None,
            sysloop: None,
            wifi: None,
            mode: None,
            subscriptions: Vec::new(),
        }
    }

    /// The underlying driver, once the radio is initialized.
    pub fn wifi(&self) -> Option<&EspWifi<'static>> {
        self.wifi.as_ref()
    }

    fn sysloop(&self) -> Result<&EspSystemEventLoop, DriverError> {
        self.sysloop
            .as_ref()
            .ok_or_else(|| DriverError::new("event loop not created"))
    }

    fn wifi_mut(&mut self) -> Result<&mut EspWifi<'static>, DriverError> {
        self.wifi
            .as_mut()
            .ok_or_else(|| DriverError::new("radio not initialized"))
    }
}

fn esp_auth(method: AuthMethod) -> EspAuthMethod {
    match method {
        AuthMethod::Open => EspAuthMethod::None,
        AuthMethod::Wpa2Personal => EspAuthMethod::WPA2Personal,
        AuthMethod::Wpa3Personal => EspAuthMethod::WPA3Personal,
    }
}

/// Build the ESP-IDF configuration for `config`.
fn esp_configuration(config: &InterfaceConfig) -> Result<Configuration, DriverError> {
    let ssid = config
        .network_name
        .as_str()
        .try_into()
        .map_err(|_| DriverError::new("SSID too long (max 32 chars)"))?;
    let password = config
        .credential
        .as_str()
        .try_into()
        .map_err(|_| DriverError::new("password too long (max 64 chars)"))?;
    let auth_method = esp_auth(config.auth_method());

    Ok(match config.mode {
        InterfaceMode::Client => Configuration::Client(ClientConfiguration {
            ssid,
            password,
            channel: (config.channel != 0).then_some(config.channel),
            auth_method,
            ..Default::default()
        }),
        InterfaceMode::AccessPoint => Configuration::AccessPoint(AccessPointConfiguration {
            ssid,
            password,
            channel: config.channel,
            auth_method,
            max_connections: config.max_peers,
            ..Default::default()
        }),
    })
}

fn on_wifi_event(sink: &EventSink, event: WifiEvent) {
    let lifecycle = match event {
        WifiEvent::StaStarted | WifiEvent::ApStarted => LifecycleEvent::InterfaceStarting,
        WifiEvent::StaConnected(_) => LifecycleEvent::LinkEstablished,
        WifiEvent::StaDisconnected(_) => LifecycleEvent::LinkLost,
        WifiEvent::ApStaConnected(peer) => LifecycleEvent::PeerJoined {
            peer_id: peer.aid(),
            mac: MacAddress(peer.mac()),
        },
        WifiEvent::ApStaDisconnected(peer) => LifecycleEvent::PeerLeft {
            peer_id: peer.aid(),
            mac: MacAddress(peer.mac()),
        },
        other => {
            debug!("Ignoring WiFi event {:?}", other);
            return;
        }
    };
    sink.emit(lifecycle);
}

impl RadioDriver for EspRadio {
    fn init_network_stack(&mut self) -> Result<(), DriverError> {
        // Taking the default partition initializes NVS flash.
        self.nvs = Some(EspDefaultNvsPartition::take().map_err(DriverError::new)?);
        Ok(())
    }

    fn create_event_loop(&mut self) -> Result<(), DriverError> {
        self.sysloop = Some(EspSystemEventLoop::take().map_err(DriverError::new)?);
        Ok(())
    }

    fn create_interface(&mut self, mode: InterfaceMode) -> Result<(), DriverError> {
        // EspWifi creates both netifs; only the requested one is activated.
        self.mode = Some(mode);
        Ok(())
    }

    fn init_radio(&mut self) -> Result<(), DriverError> {
        let modem = self
            .modem
            .take()
            .ok_or_else(|| DriverError::new("modem already in use"))?;
        let sysloop = self.sysloop()?.clone();
        let wifi = EspWifi::new(modem, sysloop, self.nvs.clone()).map_err(DriverError::new)?;
        self.wifi = Some(wifi);
        Ok(())
    }

    fn subscribe(&mut self, sink: EventSink) -> Result<(), DriverError> {
        let sysloop = self.sysloop()?.clone();

        let wifi_sink = sink.clone();
        let wifi_sub = sysloop
            .subscribe::<WifiEvent, _>(move |event| on_wifi_event(&wifi_sink, event))
            .map_err(DriverError::new)?;

        let ip_sub = sysloop
            .subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned(assignment) = event {
                    info!("got ip:{}", assignment.ip());
                    sink.emit(LifecycleEvent::AddressAssigned);
                }
            })
            .map_err(DriverError::new)?;

        self.subscriptions.push(wifi_sub);
        self.subscriptions.push(ip_sub);
        Ok(())
    }

    fn apply_config(&mut self, config: &InterfaceConfig) -> Result<(), DriverError> {
        let configuration = esp_configuration(config)?;
        self.wifi_mut()?
            .set_configuration(&configuration)
            .map_err(DriverError::new)
    }

    fn activate_mode(&mut self, mode: InterfaceMode) -> Result<(), DriverError> {
        // The configuration variant selects the mode; make sure it matches.
        let configured = self.wifi_mut()?.get_configuration().map_err(DriverError::new)?;
        let matches = matches!(
            (&configured, mode),
            (Configuration::Client(_), InterfaceMode::Client)
                | (Configuration::AccessPoint(_), InterfaceMode::AccessPoint)
        );
        if matches && self.mode == Some(mode) {
            Ok(())
        } else {
            Err(DriverError::new(format!("radio is not configured for {:?}", mode)))
        }
    }

    fn start(&mut self) -> Result<(), DriverError> {
        self.wifi_mut()?.start().map_err(DriverError::new)
    }

    fn connect(&mut self) -> Result<(), DriverError> {
        self.wifi_mut()?.connect().map_err(DriverError::new)
    }
}
