//! TimeManager (C2): per-stream swap-interval clock.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks how long the current lead has been live and whether its swap
/// interval has elapsed.
#[derive(Debug, Clone)]
pub struct TimeManager {
    start: Instant,
    swap_interval: Duration,
}

impl TimeManager {
    pub fn new(swap_interval: Duration) -> Self {
        Self { start: Instant::now(), swap_interval }
    }

    pub fn has_elapsed(&self) -> bool {
        self.start.elapsed() >= self.swap_interval
    }

    pub fn remaining(&self) -> Duration {
        self.swap_interval.saturating_sub(self.start.elapsed())
    }

    /// Update the interval; if `reset_time` is set, restart the clock.
    /// Invalid (zero) intervals are rejected and leave state unchanged.
    pub fn modify(&mut self, interval: Duration, reset_time: bool) -> Result<(), String> {
        if interval.is_zero() {
            return Err("swap interval must be positive".to_string());
        }
        self.swap_interval = interval;
        if reset_time {
            self.start = Instant::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapses_after_interval() {
        let tm = TimeManager::new(Duration::from_secs(5));
        assert!(!tm.has_elapsed());
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(tm.has_elapsed());
        assert_eq!(tm.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn modify_can_reset_clock() {
        let mut tm = TimeManager::new(Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;
        tm.modify(Duration::from_secs(10), true).unwrap();
        assert!(!tm.has_elapsed());
        assert_eq!(tm.remaining(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut tm = TimeManager::new(Duration::from_secs(5));
        assert!(tm.modify(Duration::ZERO, false).is_err());
        assert_eq!(tm.remaining(), Duration::from_secs(5));
    }
}
