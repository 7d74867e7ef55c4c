//! Injectable time source and timing jitter.
//!
//! Every wait in the engine goes through a [`Clock`], so tests can swap in a
//! clock that advances instantly instead of blocking.

use std::time::{Duration, Instant};

use rand::Rng;

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Randomised ±`fraction` variation applied to durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    fraction: f64,
}

impl Jitter {
    pub const DEFAULT_FRACTION: f64 = 0.10;

    /// Negative fractions are treated as zero.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.max(0.0),
        }
    }

    /// No variation; durations pass through unchanged.
    pub fn none() -> Self {
        Self { fraction: 0.0 }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Uniform in `[d * (1 - f), d * (1 + f)]`, never below 1ms for a
    /// non-zero input.
    pub fn apply(&self, duration: Duration) -> Duration {
        if duration.is_zero() {
            return Duration::ZERO;
        }
        if self.fraction == 0.0 {
            return duration;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.fraction)..=(1.0 + self.fraction));
        duration
            .mul_f64(factor.max(0.0))
            .max(Duration::from_millis(1))
    }

    pub fn apply_ms(&self, ms: u64) -> Duration {
        self.apply(Duration::from_millis(ms))
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_stays_zero() {
        assert_eq!(Jitter::default().apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let j = Jitter::new(0.10);
        for _ in 0..500 {
            let d = j.apply_ms(1000);
            assert!(d >= Duration::from_millis(900), "{d:?} below lower bound");
            assert!(d <= Duration::from_millis(1100), "{d:?} above upper bound");
        }
    }

    #[test]
    fn tiny_durations_floor_at_one_ms() {
        let j = Jitter::new(0.99);
        for _ in 0..200 {
            assert!(j.apply(Duration::from_micros(10)) >= Duration::from_millis(1));
        }
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(Jitter::none().apply_ms(130), Duration::from_millis(130));
        assert_eq!(Jitter::new(-0.5).fraction(), 0.0);
    }
}
