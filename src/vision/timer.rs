//! Interval timers for rate-limited button checks

use std::time::{Duration, Instant};

/// A timer that starts out reached and is armed by `reset`.
#[derive(Debug, Clone)]
pub struct Timer {
    limit: Duration,
    start: Option<Instant>,
}

impl Timer {
    pub fn new(limit: Duration) -> Self {
        Self { limit, start: None }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Whether `limit` has passed since the last reset
    pub fn reached(&self) -> bool {
        self.start
            .is_none_or(|start| start.elapsed() >= self.limit)
    }

    pub fn reset(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Forget the last reset so the timer is reached again
    pub fn clear(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_reached() {
        assert!(Timer::new(Duration::from_secs(3)).reached());
    }

    #[test]
    fn test_reset_arms_timer() {
        let mut timer = Timer::new(Duration::from_secs(3));
        timer.reset();
        assert!(!timer.reached());

        timer.clear();
        assert!(timer.reached());
    }

    #[test]
    fn test_zero_limit_always_reached() {
        let mut timer = Timer::new(Duration::ZERO);
        timer.reset();
        assert!(timer.reached());
    }
}
