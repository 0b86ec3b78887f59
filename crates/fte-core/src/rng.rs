//! Seeded, reproducible randomness with sub-streams per (turn, phase,
//! entity).
//!
//! A single shared generator would make the outcome of one entity's roll
//! depend on how many other entities were rolled before it in the same
//! phase — reordering or adding unrelated entities would then perturb
//! every roll downstream. Instead, every roll gets its own [`Rng`]
//! derived from the turn seed and the identity of what's being rolled, so
//! adding or removing unrelated entities never perturbs an existing
//! roll (spec property: reproducibility under permutation).

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

/// A deterministic sub-stream, seeded from `(seed, turn, phase-tag,
/// district-id, piece-id, faction-id, purpose-salt)`.
pub struct Rng {
    inner: SmallRng,
}

impl Rng {
    /// The master stream for a turn, seeded directly from the turn seed.
    pub fn master(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derives a sub-stream. Any subset of the key fields may be left at
    /// 0/empty when they don't apply to the roll being made; the `salt`
    /// distinguishes otherwise-identical keys (e.g. two different checks
    /// on the same piece in the same phase).
    pub fn substream(seed: u64, turn: u64, phase_tag: &str, salt: SubstreamKey) -> Self {
        let derived = derive_seed(seed, turn, phase_tag, salt);
        tracing::trace!(seed, turn, phase_tag, ?salt, derived, "derived rng substream");
        Self {
            inner: SmallRng::seed_from_u64(derived),
        }
    }

    pub fn u32(&mut self) -> u32 {
        self.inner.gen()
    }

    /// Inclusive range `[lo, hi]`.
    pub fn range(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(lo <= hi, "range lo {} > hi {}", lo, hi);
        self.inner.gen_range(lo..=hi)
    }

    pub fn bool(&mut self, p: f64) -> bool {
        self.inner.gen_bool(p.clamp(0.0, 1.0))
    }

    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// A standard d20 roll, 1..=20.
    pub fn d20(&mut self) -> i32 {
        self.range(1, 20) as i32
    }

    /// Selects an index weighted by `weights`. Panics if `weights` is
    /// empty or sums to <= 0.
    pub fn choose(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        assert!(total > 0.0, "choose: weights must sum to > 0");
        let mut r = self.unit() * total;
        for (i, &w) in weights.iter().enumerate() {
            if r < w {
                return i;
            }
            r -= w;
        }
        weights.len() - 1
    }

    /// Selects and removes a uniformly random element from `items`.
    pub fn pick_uniform<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range(0, items.len() as i64 - 1) as usize;
        items.get(idx)
    }
}

/// Components identifying which sub-stream to derive. Fields that don't
/// apply to a given roll are left at their default (0).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstreamKey {
    pub district_id: u64,
    pub piece_id: u64,
    pub faction_id: u64,
    pub salt: u64,
}

impl SubstreamKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn district(mut self, id: u64) -> Self {
        self.district_id = id;
        self
    }

    pub fn piece(mut self, id: u64) -> Self {
        self.piece_id = id;
        self
    }

    pub fn faction(mut self, id: u64) -> Self {
        self.faction_id = id;
        self
    }

    pub fn salt(mut self, salt: u64) -> Self {
        self.salt = salt;
        self
    }
}

/// SplitMix64: fast, fixed, and stable across platforms and Rust
/// versions — unlike `DefaultHasher`, whose algorithm is explicitly
/// unspecified, this can't silently change the entire turn's outcome
/// under a toolchain upgrade.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn mix(acc: u64, value: u64) -> u64 {
    splitmix64(acc ^ splitmix64(value))
}

fn derive_seed(seed: u64, turn: u64, phase_tag: &str, key: SubstreamKey) -> u64 {
    let mut acc = splitmix64(seed);
    acc = mix(acc, turn);
    for byte_chunk in phase_tag.as_bytes().chunks(8) {
        let mut buf = [0u8; 8];
        buf[..byte_chunk.len()].copy_from_slice(byte_chunk);
        acc = mix(acc, u64::from_le_bytes(buf));
    }
    acc = mix(acc, key.district_id);
    acc = mix(acc, key.piece_id);
    acc = mix(acc, key.faction_id);
    acc = mix(acc, key.salt);
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_sequence() {
        let mut a = Rng::substream(42, 1, "action", SubstreamKey::new().piece(7));
        let mut b = Rng::substream(42, 1, "action", SubstreamKey::new().piece(7));
        let seq_a: Vec<i32> = (0..20).map(|_| a.d20()).collect();
        let seq_b: Vec<i32> = (0..20).map(|_| b.d20()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn different_entity_different_sequence() {
        let mut a = Rng::substream(42, 1, "action", SubstreamKey::new().piece(7));
        let mut b = Rng::substream(42, 1, "action", SubstreamKey::new().piece(8));
        let seq_a: Vec<i32> = (0..20).map(|_| a.d20()).collect();
        let seq_b: Vec<i32> = (0..20).map(|_| b.d20()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn order_independent() {
        // Deriving piece 7's substream does not depend on whether piece
        // 8's substream was derived first.
        let mut first = Rng::substream(42, 3, "monitor", SubstreamKey::new().piece(7));
        let _ = Rng::substream(42, 3, "monitor", SubstreamKey::new().piece(8));
        let mut second = Rng::substream(42, 3, "monitor", SubstreamKey::new().piece(7));
        assert_eq!(first.d20(), {
            // second was derived independently; should match first's
            // first draw since both come from the same key.
            second.d20()
        });
    }

    #[test]
    fn d20_in_range() {
        let mut r = Rng::master(1);
        for _ in 0..500 {
            let v = r.d20();
            assert!((1..=20).contains(&v));
        }
    }

    #[test]
    fn choose_respects_zero_weights() {
        let mut r = Rng::master(1);
        for _ in 0..200 {
            let idx = r.choose(&[0.0, 0.0, 1.0]);
            assert_eq!(idx, 2);
        }
    }
}
