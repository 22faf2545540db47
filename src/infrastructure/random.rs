//! Random source adapters
//!
//! `ThreadRandom` backs normal play. `SeededRandom` replays a session from a
//! seed, and `FixedRandom` scripts exact rolls for tests.

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::application::ports::outbound::RandomPort;

fn ordered(min: i32, max: i32) -> (i32, i32) {
    if min <= max {
        (min, max)
    } else {
        (max, min)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomPort for ThreadRandom {
    fn random_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn random_range(&self, min: i32, max: i32) -> i32 {
        let (low, high) = ordered(min, max);
        rand::thread_rng().gen_range(low..=high)
    }
}

pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomPort for SeededRandom {
    fn random_f64(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen::<f64>()
    }

    fn random_range(&self, min: i32, max: i32) -> i32 {
        let (low, high) = ordered(min, max);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(low..=high)
    }
}

/// Cycles through scripted values in `[0, 1)`.
///
/// `random_range` scales the next value into the range, so `0.0` always
/// yields the minimum and anything close to `1.0` the maximum.
#[cfg(test)]
pub struct FixedRandom {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

#[cfg(test)]
impl FixedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() { vec![0.0] } else { values };
        Self {
            values: values.into_iter().map(|v| v.clamp(0.0, 0.999_999)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Every roll returns the same value
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    fn next(&self) -> f64 {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[index]
    }
}

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn random_f64(&self) -> f64 {
        self.next()
    }

    fn random_range(&self, min: i32, max: i32) -> i32 {
        let (low, high) = ordered(min, max);
        let span = (high as i64 - low as i64 + 1) as f64;
        let offset = (self.next() * span).floor() as i64;
        (low as i64 + offset).clamp(low as i64, high as i64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let rolls_a: Vec<i32> = (0..20).map(|_| a.random_range(1, 100)).collect();
        let rolls_b: Vec<i32> = (0..20).map(|_| b.random_range(1, 100)).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn test_ranges_are_inclusive() {
        let rng = ThreadRandom;
        for _ in 0..200 {
            let roll = rng.random_range(3, 5);
            assert!((3..=5).contains(&roll));
        }
        assert_eq!(rng.random_range(7, 7), 7);
    }

    #[test]
    fn test_fixed_random_scales_into_range() {
        let rng = FixedRandom::new(vec![0.0, 0.5, 0.99]);
        assert_eq!(rng.random_range(10, 30), 10);
        assert_eq!(rng.random_range(10, 30), 20);
        assert_eq!(rng.random_range(10, 30), 30);
        assert_eq!(rng.random_range(10, 30), 10);
    }

    #[test]
    fn test_fixed_random_chance() {
        assert!(FixedRandom::constant(0.0).chance(0.15));
        assert!(!FixedRandom::constant(0.9).chance(0.15));
        assert_eq!(FixedRandom::constant(0.99).pick_index(4), 3);
    }
}
