//! Injectable randomness for the flaky-backend simulation.
//!
//! Production uses [`ThreadChance`] (thread-local `rand` generator); tests
//! inject a [`FixedChance`] so that coin tosses and delays are deterministic.

use std::time::Duration;

use rand::Rng;

/// Source of the random decisions the gateway makes per request.
pub trait Chance: Send + Sync + std::fmt::Debug {
    /// True with the given probability (`0.0..=1.0`).
    fn flip(&self, probability: f64) -> bool;

    /// A delay drawn from `1..=max_ms` milliseconds; zero when `max_ms` is 0.
    fn delay(&self, max_ms: u64) -> Duration;

    /// An index in `0..len`. `len` must be non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Real randomness from `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadChance;

impl Chance for ThreadChance {
    fn flip(&self, probability: f64) -> bool {
        // Same shape as "draw > 0.75" for a 0.25 probability.
        rand::thread_rng().gen::<f64>() > 1.0 - probability
    }

    fn delay(&self, max_ms: u64) -> Duration {
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(1..=max_ms))
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic answers for tests and reproducible runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedChance {
    /// Answer for every coin toss.
    pub flip: bool,
    /// Delay returned regardless of the requested maximum.
    pub delay_ms: u64,
    /// Index returned by `pick`, clamped to the slice length.
    pub pick: usize,
}

impl Chance for FixedChance {
    fn flip(&self, _probability: f64) -> bool {
        self.flip
    }

    fn delay(&self, _max_ms: u64) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn pick(&self, len: usize) -> usize {
        self.pick.min(len.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_chance_respects_bounds() {
        let chance = ThreadChance;
        for _ in 0..200 {
            let d = chance.delay(100);
            assert!(d >= Duration::from_millis(1) && d <= Duration::from_millis(100));
            assert!(chance.pick(9) < 9);
        }
        assert_eq!(chance.delay(0), Duration::ZERO);
    }

    #[test]
    fn thread_chance_extremes() {
        let chance = ThreadChance;
        for _ in 0..100 {
            assert!(!chance.flip(0.0));
            assert!(chance.flip(1.0));
        }
    }

    #[test]
    fn fixed_chance_clamps_pick() {
        let chance = FixedChance { pick: 42, ..Default::default() };
        assert_eq!(chance.pick(3), 2);
    }
}
