//! Reviewer selection policy.
//!
//! The pure functions take the random generator as an argument; the
//! `ReviewerPicker` owns the one generator a service instance uses.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Reviewers assigned when a pull request is created.
pub const REVIEWERS_PER_PULL_REQUEST: usize = 2;

/// Uniform sample of up to `target` candidates without replacement.
///
/// A pool smaller than `target` is returned whole (in shuffled order).
pub fn pick_reviewers<T, R: Rng + ?Sized>(rng: &mut R, mut pool: Vec<T>, target: usize) -> Vec<T> {
    pool.shuffle(rng);
    pool.truncate(target);
    pool
}

/// Uniform pick of one replacement, `None` if the pool is empty.
pub fn pick_replacement<T, R: Rng + ?Sized>(rng: &mut R, mut pool: Vec<T>) -> Option<T> {
    if pool.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..pool.len());
    Some(pool.swap_remove(idx))
}

/// Owns the random generator for one service instance.
pub struct ReviewerPicker {
    rng: Mutex<StdRng>,
}

impl ReviewerPicker {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Generator with a fixed seed, for reproducible selection.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick up to `REVIEWERS_PER_PULL_REQUEST` reviewers.
    pub fn pick_for_creation<T>(&self, pool: Vec<T>) -> Vec<T> {
        self.with_rng(|rng| pick_reviewers(rng, pool, REVIEWERS_PER_PULL_REQUEST))
    }

    /// Pick one replacement reviewer.
    pub fn pick_for_reassignment<T>(&self, pool: Vec<T>) -> Option<T> {
        self.with_rng(|rng| pick_replacement(rng, pool))
    }

    fn with_rng<O>(&self, f: impl FnOnce(&mut StdRng) -> O) -> O {
        // Generator state stays valid across a poisoning panic.
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }
}
