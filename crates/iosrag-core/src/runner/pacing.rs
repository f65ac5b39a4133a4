//! Simulated latency between steps.

use std::time::Duration;

/// Base delay unit multiplied by per-step weights.
///
/// `Pacing::none()` disables every delay, which is what tests use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    unit: Duration,
}

impl Pacing {
    pub const fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub const fn none() -> Self {
        Self {
            unit: Duration::ZERO,
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub const fn is_none(self) -> bool {
        self.unit.is_zero()
    }

    /// Delay for a step of the given weight.
    pub fn delay(self, weight: f64) -> Duration {
        if self.is_none() || weight <= 0.0 {
            return Duration::ZERO;
        }
        self.unit.mul_f64(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_delays() {
        assert_eq!(Pacing::none().delay(10.0), Duration::ZERO);
    }

    #[test]
    fn test_weighted_delay() {
        let pacing = Pacing::from_millis(500);
        assert_eq!(pacing.delay(4.0), Duration::from_secs(2));
        assert_eq!(pacing.delay(-1.0), Duration::ZERO);
    }
}
