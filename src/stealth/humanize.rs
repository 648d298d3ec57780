//! Human behavior simulation for anti-detection

use std::time::Duration;

use rand::Rng;

use crate::vision::button::Area;

/// Humanizer for generating realistic timing and positions
pub struct Humanizer {
    rng: rand::rngs::ThreadRng,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    /// Create a new humanizer
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }

    /// Random point inside `area`, biased towards its center
    pub fn random_point(&mut self, area: Area) -> (i32, i32) {
        if area.is_empty() {
            return area.center();
        }
        let x = self.normal_int(area.x1, area.x2 - 1);
        let y = self.normal_int(area.y1, area.y2 - 1);
        (x, y)
    }

    /// Mean of three uniform samples in `low..=high`
    fn normal_int(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let sum: i64 = (0..3)
            .map(|_| self.rng.random_range(low..=high) as i64)
            .sum();
        (sum / 3) as i32
    }

    /// Uniform duration within `(low, high)` seconds
    pub fn random_duration(&mut self, (low, high): (f32, f32)) -> Duration {
        let (low, high) = (low.max(0.0), high.max(0.0));
        let seconds = if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        };
        Duration::from_secs_f32(seconds)
    }

    /// Humanize a delay with variance
    pub fn humanize_delay(&mut self, base_delay_ms: u64, variance_percent: u32) -> u64 {
        if variance_percent == 0 {
            return base_delay_ms;
        }

        let variance = (base_delay_ms as f64 * variance_percent as f64 / 100.0) as i64;
        let offset = self.rng.random_range(-variance..=variance);

        (base_delay_ms as i64 + offset).max(0) as u64
    }

    /// Check if a micro-pause should occur
    pub fn should_micro_pause(&mut self, probability: f32) -> bool {
        self.rng.random::<f32>() < probability
    }

    /// Get micro-pause duration
    pub fn micro_pause_duration(&mut self) -> Duration {
        Duration::from_millis(self.rng.random_range(500..=2000))
    }
}
