//! Connectivity supervisor.
//!
//! Runs once per loop iteration with the current network state.  A network
//! stack that stays down longer than the configured limit is treated as
//! hung: the supervisor raises [`Error::ConnectivityTimeout`], which is
//! fatal and makes the firmware restart.
//!
//! ## Lifecycle
//!
//! 1. At boot the offline window starts immediately, so a device that
//!    never connects still restarts after the limit.
//! 2. Every observation with the network up moves the window start.
//! 3. Transitions are logged once, not on every check.

use log::{error, info, warn};

use crate::error::Error;

pub struct ConnectivitySupervisor {
    max_offline_ms: u64,
    /// Uptime of the last observation with the network up (or boot).
    last_online_ms: u64,
    online: bool,
}

impl ConnectivitySupervisor {
    pub fn new(max_offline_ms: u64, now_ms: u64) -> Self {
        Self {
            max_offline_ms,
            last_online_ms: now_ms,
            online: false,
        }
    }

    /// Record the network state.  Fails once the network has been down for
    /// strictly longer than the limit.
    pub fn check(&mut self, network_up: bool, now_ms: u64) -> Result<(), Error> {
        if network_up {
            if !self.online {
                info!("Network up");
            }
            self.online = true;
            self.last_online_ms = now_ms;
            return Ok(());
        }

        if self.online {
            warn!("Network lost");
            self.online = false;
        }

        let offline_ms = self.offline_ms(now_ms);
        if offline_ms > self.max_offline_ms {
            error!("No network for {} ms, giving up", offline_ms);
            return Err(Error::ConnectivityTimeout {
                offline_secs: offline_ms / 1000,
            });
        }
        Ok(())
    }

    /// Milliseconds since the network was last seen up.
    pub fn offline_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_online_ms)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }
}
