/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running { remaining: u32 },
    Expired,
}

/// Per-question countdown advanced one second per tick.
///
/// Pure state; the async driver that feeds it lives in the services crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
        }
    }

    /// Consume one second. Stays `Expired` once it hits zero.
    pub fn tick(&mut self) -> CountdownTick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            CountdownTick::Expired
        } else {
            CountdownTick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// True once the remaining time is at or under `threshold_secs`.
    #[must_use]
    pub fn is_urgent(&self, threshold_secs: u32) -> bool {
        self.remaining <= threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), CountdownTick::Running { remaining: 2 });
        assert_eq!(countdown.tick(), CountdownTick::Running { remaining: 1 });
        assert_eq!(countdown.tick(), CountdownTick::Expired);
        assert_eq!(countdown.tick(), CountdownTick::Expired);
    }

    #[test]
    fn becomes_urgent_at_the_threshold() {
        let mut countdown = Countdown::new(10);
        assert!(!countdown.is_urgent(5));
        for _ in 0..4 {
            countdown.tick();
        }
        assert!(!countdown.is_urgent(5));
        countdown.tick();
        assert!(countdown.is_urgent(5));
    }

    #[test]
    fn zero_duration_is_already_expired() {
        let mut countdown = Countdown::new(0);
        assert!(countdown.is_urgent(0));
        assert_eq!(countdown.tick(), CountdownTick::Expired);
    }
}
