//! Device configuration.

use std::time::Duration;

use boltlock_proto::EndpointId;
use serde::{Deserialize, Serialize};

use crate::{actuator::LockState, error::ConfigError};

/// Stable state the lock assumes at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootState {
    /// Bolt assumed thrown
    #[default]
    Locked,
    /// Bolt assumed retracted
    Unlocked,
}

impl From<BootState> for LockState {
    fn from(boot: BootState) -> Self {
        match boot {
            BootState::Locked => Self::Locked,
            BootState::Unlocked => Self::Unlocked,
        }
    }
}

/// Device configuration
///
/// Every field has a default, so a partial JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Endpoints that carry this lock
    pub lock_endpoints: Vec<EndpointId>,
    /// Number of user slots
    pub user_slots: u16,
    /// State assumed at boot
    pub boot_state: BootState,
    /// Refuse remote lock/unlock commands without a valid PIN
    pub require_pin_for_remote: bool,
    /// Motion watchdog in milliseconds; `None` disables it
    pub actuator_timeout_ms: Option<u64>,
    /// Relock this long after an unlock completes; `None` disables it
    pub auto_relock_ms: Option<u64>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            lock_endpoints: vec![1, 2],
            user_slots: 10,
            boot_state: BootState::Locked,
            require_pin_for_remote: false,
            actuator_timeout_ms: Some(10_000),
            auto_relock_ms: None,
        }
    }
}

impl DeviceConfig {
    /// Check invariants the rest of the core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.user_slots == 0 {
            return Err(ConfigError::NoUserSlots);
        }
        if self.actuator_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroDuration("actuator_timeout_ms"));
        }
        if self.auto_relock_ms == Some(0) {
            return Err(ConfigError::ZeroDuration("auto_relock_ms"));
        }
        Ok(())
    }

    /// Whether `endpoint` carries this lock.
    #[must_use]
    pub fn is_lock_endpoint(&self, endpoint: EndpointId) -> bool {
        self.lock_endpoints.contains(&endpoint)
    }

    /// Motion watchdog timeout.
    #[must_use]
    pub fn actuator_timeout(&self) -> Option<Duration> {
        self.actuator_timeout_ms.map(Duration::from_millis)
    }

    /// Auto-relock delay.
    #[must_use]
    pub fn auto_relock(&self) -> Option<Duration> {
        self.auto_relock_ms.map(Duration::from_millis)
    }
}
