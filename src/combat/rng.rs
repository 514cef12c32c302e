//! Fast PRNG for combat simulation. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.
//!
//! Every probabilistic decision in the engine goes through [RollSource], so callers can inject
//! a seeded [Rng] for replay or a [ScriptedRolls] to force specific branches in tests.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// 2^53: number of distinct f64 values produced by [RollSource::next_f64].
const F64_UNIT: f64 = (1u64 << 53) as f64;

/// Source of randomness for the engine. Only [next_u64](RollSource::next_u64) is required;
/// the remaining draws are derived from it so every source behaves identically for the same stream.
pub trait RollSource {
    fn next_u64(&mut self) -> u64;

    /// Uniform draw in `[0, 1)`.
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / F64_UNIT
    }

    /// True with probability `p` (clamped to `[0, 1]`). Always consumes one draw.
    #[inline]
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p.clamp(0.0, 1.0)
    }

    /// Uniform draw in `[lo, hi)`.
    #[inline]
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    #[inline]
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// Pick proportionally to weight. Non-positive (or NaN) weights are never picked.
    /// Returns None when no entry has a positive weight. Consumes one draw when a pick is possible.
    fn weighted_pick<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = items.iter().map(|(_, w)| effective_weight(*w)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut target = self.next_f64() * total;
        let mut last_positive = None;
        for (item, weight) in items {
            let weight = effective_weight(*weight);
            if weight <= 0.0 {
                continue;
            }
            if target < weight {
                return Some(item);
            }
            target -= weight;
            last_positive = Some(item);
        }
        // Float drift on the final bucket.
        last_positive
    }

    /// Fisher–Yates shuffle.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }
}

fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

/// A fresh seed from OS entropy, falling back to the wall clock if the OS source is unavailable.
pub fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            tracing::warn!("os entropy unavailable ({err}); seeding from clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(SPLITMIX64_GOLDEN)
        }
    }
}

impl RollSource for Rng {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }
}

impl<R: RollSource + ?Sized> RollSource for &mut R {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// Replays a fixed list of fractions in `[0, 1)`, cycling when exhausted.
/// Each value is returned (to 53-bit precision) by [RollSource::next_f64].
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRolls {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let mut values: Vec<f64> = values.into();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values, cursor: 0 }
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RollSource for ScriptedRolls {
    fn next_u64(&mut self) -> u64 {
        let value = self.values[self.cursor % self.values.len()].clamp(0.0, 1.0 - f64::EPSILON);
        self.cursor += 1;
        ((value * F64_UNIT) as u64) << 11
    }
}
