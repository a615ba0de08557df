//! Injectable randomness for the fault model.
//!
//! # Responsibilities
//! - Single source of every probabilistic decision (failure rolls,
//!   decline selection, latency jitter)
//! - Deterministic substitutes for tests
//!
//! # Design Decisions
//! - Components never touch a thread RNG directly; they hold an
//!   `Arc<dyn FaultDice>` bound at construction
//! - A roll below the configured rate means the fault fires
//! - Seeded dice make statistical assertions reproducible

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Source of randomness behind the chaos behavior.
pub trait FaultDice: Send + Sync {
    /// Uniform draw from `[0, 1)`. Compared against a failure rate.
    fn roll(&self) -> f64;

    /// Uniform index draw from `0..n`. Selects a decline kind.
    fn pick(&self, n: usize) -> usize;

    /// Uniform delay draw from `[min, max]`.
    fn delay(&self, min: Duration, max: Duration) -> Duration;
}

/// Production dice backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDice;

impl FaultDice for ThreadRngDice {
    fn roll(&self) -> f64 {
        rand::thread_rng().gen()
    }

    fn pick(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }

    fn delay(&self, min: Duration, max: Duration) -> Duration {
        let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Reproducible dice for statistical tests.
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl FaultDice for SeededDice {
    fn roll(&self) -> f64 {
        self.with_rng(|rng| rng.gen())
    }

    fn pick(&self, n: usize) -> usize {
        self.with_rng(|rng| rng.gen_range(0..n))
    }

    fn delay(&self, min: Duration, max: Duration) -> Duration {
        let secs = self.with_rng(|rng| rng.gen_range(min.as_secs_f64()..=max.as_secs_f64()));
        Duration::from_secs_f64(secs)
    }
}

/// Dice with pinned outcomes. Lets tests force always-succeed,
/// always-fail, and a fixed decline kind without sampling noise.
#[derive(Debug, Clone, Copy)]
pub struct RiggedDice {
    roll: f64,
    pick: usize,
}

impl RiggedDice {
    /// Every roll lands below any non-zero failure rate.
    pub fn always_fail(pick: usize) -> Self {
        Self { roll: 0.0, pick }
    }

    /// Every roll lands at or above any failure rate, 1.0 included.
    pub fn always_succeed() -> Self {
        Self { roll: 1.0, pick: 0 }
    }
}

impl FaultDice for RiggedDice {
    fn roll(&self) -> f64 {
        self.roll
    }

    fn pick(&self, n: usize) -> usize {
        self.pick.min(n.saturating_sub(1))
    }

    fn delay(&self, min: Duration, _max: Duration) -> Duration {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_are_reproducible() {
        let a = SeededDice::new(42);
        let b = SeededDice::new(42);
        let rolls_a: Vec<f64> = (0..16).map(|_| a.roll()).collect();
        let rolls_b: Vec<f64> = (0..16).map(|_| b.roll()).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn delay_stays_within_bounds() {
        let dice = ThreadRngDice;
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(500);
        for _ in 0..64 {
            let d = dice.delay(min, max);
            assert!(d >= min && d <= max, "delay {:?} out of bounds", d);
        }
    }

    #[test]
    fn delay_with_equal_bounds_is_exact() {
        let dice = ThreadRngDice;
        let d = dice.delay(Duration::ZERO, Duration::ZERO);
        assert_eq!(d, Duration::ZERO);
    }

    #[test]
    fn rigged_dice_pin_outcomes() {
        let fail = RiggedDice::always_fail(2);
        assert_eq!(fail.roll(), 0.0);
        assert_eq!(fail.pick(4), 2);
        assert_eq!(fail.pick(2), 1, "pick clamps to the catalog size");

        let ok = RiggedDice::always_succeed();
        assert!(ok.roll() >= 1.0);
        assert_eq!(
            ok.delay(Duration::ZERO, Duration::from_secs(3)),
            Duration::ZERO
        );
    }
}
