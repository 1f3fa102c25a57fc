//! One-shot randomized ordering of a load.
//!
//! The feed shuffles exactly once per successful load and keeps the result
//! in an [`OrderedSet`].  The set carries the load generation so anything
//! derived from it can tell a genuine reshuffle from a mere re-render.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::ad::Ad;

// ───────────────────────────────────────── randomness ─────────

/// Source of uniformly distributed integers.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `0..n`.  Rejection sampling avoids modulo bias.
    fn below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let n = n as u64;
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let x = self.next_u64();
            if x < zone {
                return (x % n) as usize;
            }
        }
    }
}

/// xorshift64* generator.  Small, fast and plenty for ordering cards.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        // A zero state would stay zero forever.
        let state = splitmix64(seed);
        Self {
            state: if state == 0 { 0x9E37_79B9_7F4A_7C15 } else { state },
        }
    }

    /// Seeded from the wall clock and the process id.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos ^ (u64::from(std::process::id()) << 32))
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fisher–Yates shuffle: every permutation equally likely.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

// ───────────────────────────────────────── ordered set ────────

/// The permuted item list of one load.
///
/// Cloning is cheap (shared slice) and keeps the same identity.
#[derive(Debug, Clone)]
pub struct OrderedSet {
    generation: u64,
    items: Arc<[Ad]>,
}

impl OrderedSet {
    /// Shuffle `items` and freeze them under `generation`.
    pub fn from_load(mut items: Vec<Ad>, generation: u64, rng: &mut dyn RandomSource) -> Self {
        shuffle(&mut items, rng);
        Self {
            generation,
            items: items.into(),
        }
    }

    /// An empty set, used when a load fails.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            items: Arc::from(Vec::new()),
        }
    }

    pub fn items(&self) -> &[Ad] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when both handles come from the same load.
    pub fn same_load(&self, other: &OrderedSet) -> bool {
        self.generation == other.generation && Arc::ptr_eq(&self.items, &other.items)
    }
}
