//! ESP32 time adapter.
//!
//! Two clocks are exposed:
//!
//! - a **monotonic uptime** in milliseconds for all control timing,
//!   `esp_timer_get_time()` on target and `std::time::Instant` on the host;
//! - the **wall clock** for published timestamps, kept in sync by SNTP on
//!   target.  Timestamps are formatted with `chrono` as
//!   `YYYY-MM-DDTHH:MM:SSZ`.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

/// Anything earlier is an unsynced RTC.
const EPOCH_2020: i64 = 1_577_836_800;

/// Render Unix seconds as an ISO-8601 UTC timestamp.
pub fn format_timestamp(unix_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(target_os = "espidf")]
    sntp: Option<EspSntp<'static>>,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(target_os = "espidf")]
            sntp: None,
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Start background SNTP synchronisation.  Requires a network stack.
    #[cfg(target_os = "espidf")]
    pub fn start_sntp(&mut self) -> anyhow::Result<()> {
        if self.sntp.is_none() {
            self.sntp = Some(EspSntp::new_default()?);
            log::info!("SNTP started");
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start_sntp(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether the wall clock has been set at least once.
    pub fn is_synced(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            let sntp_done = self
                .sntp
                .as_ref()
                .is_some_and(|s| s.get_sync_status() == SyncStatus::Completed);
            sntp_done && self.unix_time_secs().is_some()
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.unix_time_secs().is_some()
        }
    }

    /// Seconds since the Unix epoch, `None` while the clock is unsynced.
    pub fn unix_time_secs(&self) -> Option<i64> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        let secs = i64::try_from(secs).ok()?;
        (secs >= EPOCH_2020).then_some(secs)
    }

    /// Current wall-clock timestamp.  Before the first sync this reports
    /// the raw RTC value, starting at 1970.
    pub fn timestamp(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        format_timestamp(secs)
    }
}
