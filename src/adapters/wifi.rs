//! WiFi station-mode adapter.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` in station mode.  An IP-event
//!   subscription pushes [`Event::NetworkUp`] into the global queue so the
//!   control loop wakes as soon as an address is assigned.
//! - **all other targets**: a simulated link whose state tests can set.
//!
//! ## Reconnection policy
//!
//! [`WifiAdapter::poll`] is called every loop step.  While the link is down
//! it re-issues a connect after an exponential backoff (2 s → 4 s → 8 s …
//! capped at 60 s).  The backoff resets once the link is up.

use core::fmt;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::modem::Modem;
#[cfg(target_os = "espidf")]
use esp_idf_svc::netif::IpEvent;
#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::EspDefaultNvsPartition;
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

#[cfg(target_os = "espidf")]
use crate::events::{self, Event};

// ───────────────────────────────────────────────────────────────
// Errors & state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
}

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u64,
    next_attempt_ms: u64,

    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    _ip_events: EspSubscription<'static, System>,

    /// Simulated link state.
    #[cfg(not(target_os = "espidf"))]
    pub sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let ip_events = sysloop.subscribe::<IpEvent, _>(|event| {
            if matches!(event, IpEvent::DhcpIpAssigned(_)) {
                events::push_event(Event::NetworkUp);
            }
        })?;
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            wifi,
            _ip_events: ip_events,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn simulated() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            sim_link_up: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Configure the station and issue the first connect.  Does not wait
    /// for the association; [`poll`](Self::poll) tracks progress.
    pub fn start(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        self.platform_start()?;
        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting { attempt: 0 };
        self.next_attempt_ms = now_ms + self.backoff_ms;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.platform_is_up()
    }

    /// Track the link and retry with backoff while it is down.
    pub fn poll(&mut self, now_ms: u64) {
        let up = self.platform_is_up();
        match self.state {
            WifiState::Connected if !up => {
                warn!("WiFi: connection lost, reconnecting");
                self.state = WifiState::Connecting { attempt: 0 };
                self.next_attempt_ms = now_ms;
            }
            WifiState::Connecting { .. } if up => {
                info!("WiFi: connected");
                self.state = WifiState::Connected;
                self.backoff_ms = INITIAL_BACKOFF_MS;
            }
            WifiState::Connecting { attempt } if now_ms >= self.next_attempt_ms => {
                info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt + 1, self.backoff_ms);
                if let Err(e) = self.platform_connect() {
                    warn!("WiFi: {}", e);
                }
                self.state = WifiState::Connecting { attempt: attempt + 1 };
                self.next_attempt_ms = now_ms + self.backoff_ms;
                self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            _ => {}
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.platform_connect()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), ConnectivityError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        info!("WiFi(sim): connect issued");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up(&self) -> bool {
        self.sim_link_up
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
