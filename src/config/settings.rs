//! Runtime settings
//!
//! Defines the typed options that control how the agent polls and clicks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stealth::StealthConfig;
use crate::vision::Server;

/// Main settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Game server, selects asset variants
    pub server: Server,
    /// Polling and timeout settings
    pub timings: TimingSettings,
    /// Humanized input settings
    pub stealth: StealthConfig,
}

/// Timing settings for screen polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Wait between two screenshots (ms)
    pub poll_interval: u64,
    /// Minimum time between two clicks on the same battle result screen (ms)
    pub battle_status_click_interval: u64,
    /// Give up on the preparation phase after this long (s)
    pub preparation_timeout: u64,
    /// Give up on a battle that is still running after this long (s)
    pub execution_timeout: u64,
    /// Give up on the result screens after this long (s)
    pub status_timeout: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            poll_interval: 300,
            battle_status_click_interval: 0,
            preparation_timeout: 60,
            execution_timeout: 600,
            status_timeout: 120,
        }
    }
}

impl TimingSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Click interval for result screens, `None` when clicks are not limited
    pub fn battle_status_click_interval(&self) -> Option<Duration> {
        (self.battle_status_click_interval > 0)
            .then(|| Duration::from_millis(self.battle_status_click_interval))
    }

    pub fn preparation_timeout(&self) -> Duration {
        Duration::from_secs(self.preparation_timeout)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout)
    }
}
