//! Random source port
//!
//! Battle resolution and loot rolls draw from this instead of a global RNG
//! so a seeded or scripted source makes them reproducible.

pub trait RandomPort: Send + Sync {
    /// Uniform in `[0, 1)`
    fn random_f64(&self) -> f64;

    /// Uniform in `[min, max]`, inclusive on both ends
    fn random_range(&self, min: i32, max: i32) -> i32;

    /// `true` with the given probability
    fn chance(&self, probability: f64) -> bool {
        self.random_f64() < probability
    }

    /// Uniform index into a collection of `len` elements; `len` must be non-zero
    fn pick_index(&self, len: usize) -> usize {
        let max = len.saturating_sub(1).min(i32::MAX as usize) as i32;
        self.random_range(0, max).max(0) as usize
    }
}
