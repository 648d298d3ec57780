//! Stealth and anti-detection module
//!
//! Taps land on a random point inside the target rectangle, fixed waits get
//! random variance, and every so often the agent pauses briefly.

pub mod humanize;

pub use humanize::*;

use serde::{Deserialize, Serialize};

/// Configuration for stealth behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Tap a random point of the button instead of its center
    pub humanize_position: bool,
    /// Enable humanized timing for poll waits
    pub humanize_timing: bool,
    /// Enable random micro-pauses after taps
    pub enable_micro_pauses: bool,
    /// Base delay variance percentage (0-100)
    pub timing_variance_percent: u32,
    /// Probability of micro-pause (0.0-1.0)
    pub micro_pause_probability: f32,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            humanize_position: true,
            humanize_timing: true,
            enable_micro_pauses: false,
            timing_variance_percent: 20,
            micro_pause_probability: 0.05,
        }
    }
}

impl StealthConfig {
    /// Create a config with no stealth (for testing)
    pub fn disabled() -> Self {
        Self {
            humanize_position: false,
            humanize_timing: false,
            enable_micro_pauses: false,
            timing_variance_percent: 0,
            micro_pause_probability: 0.0,
        }
    }
}
