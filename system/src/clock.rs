use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// When this process started.
#[derive(Debug, Clone, Copy)]
pub struct BootClock {
    boot_time: DateTime<Utc>,
    started: Instant,
}

impl BootClock {
    pub fn start() -> Self {
        Self {
            boot_time: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn boot_time(&self) -> DateTime<Utc> {
        self.boot_time
    }

    /// Monotonic, unaffected by wall clock adjustments.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for BootClock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_advances() {
        let clock = BootClock::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.uptime() >= Duration::from_millis(5));
        assert!(clock.boot_time() <= Utc::now());
    }
}
