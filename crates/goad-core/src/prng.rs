//! Deterministic xorshift64* pseudorandom generator.
//!
//! `Prng::new(seed)` is the sole entry point into randomness anywhere in the
//! kernel (scheduler, request selection, backpressure delay). Two generators
//! constructed from the same seed produce identical infinite sequences; no
//! generator ever touches process-global state.

use crate::error::PrngError;

const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Seeded, deterministic 64-bit generator.
#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    /// Construct a generator from a 64-bit seed.
    ///
    /// `seed == 0` is accepted and produces a degenerate (all-zero) sequence
    /// rather than being remapped: xorshift64* has a fixed point at state
    /// `0`. Remapping it to some other constant would make `new(0)` and
    /// `new(that constant)` produce identical sequences, breaking
    /// `new(s1) == new(s2) iff s1 == s2`; leaving it as-is keeps that
    /// contract exact at the cost of seed `0` being a degenerate choice.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Advance the generator and return the next 64-bit value.
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Return a value uniformly distributed in `[0, max)`.
    ///
    /// Fails with [`PrngError::InvalidRange`] when `max == 0`. Uses Lemire's
    /// rejection-free bounded-integer method so the result is unbiased for
    /// any `max`, not just powers of two.
    pub fn range(&mut self, max: u64) -> Result<u64, PrngError> {
        if max == 0 {
            return Err(PrngError::InvalidRange);
        }
        if max == 1 {
            return Ok(0);
        }
        let mut m = u128::from(self.next()) * u128::from(max);
        let mut low = m as u64;
        if low < max {
            let threshold = max.wrapping_neg() % max;
            while low < threshold {
                m = u128::from(self.next()) * u128::from(max);
                low = m as u64;
            }
        }
        Ok((m >> 64) as u64)
    }

    /// Fisher-Yates shuffle in place, depending only on the current state.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        if slice.len() < 2 {
            return;
        }
        for i in (1..slice.len()).rev() {
            // range(i + 1) cannot fail: i + 1 >= 2.
            let j = self.range((i as u64) + 1).expect("i + 1 is non-zero") as usize;
            slice.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::new(42);
        let mut b = Prng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Prng::new(1);
        let mut b = Prng::new(2);
        let seq_a: Vec<u64> = (0..8).map(|_| a.next()).collect();
        let seq_b: Vec<u64> = (0..8).map(|_| b.next()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn range_one_always_zero() {
        let mut p = Prng::new(7);
        for _ in 0..50 {
            assert_eq!(p.range(1).unwrap(), 0);
        }
    }

    #[test]
    fn range_zero_is_invalid() {
        let mut p = Prng::new(7);
        assert_eq!(p.range(0), Err(PrngError::InvalidRange));
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut p = Prng::new(123456789);
        for _ in 0..10_000 {
            let v = p.range(17).unwrap();
            assert!(v < 17);
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut p = Prng::new(99);
        let mut values: Vec<u32> = (0..20).collect();
        let original = values.clone();
        p.shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, original);
    }

    #[test]
    fn shuffle_depends_only_on_state() {
        let mut p1 = Prng::new(5);
        let mut p2 = Prng::new(5);
        let mut v1: Vec<u32> = (0..10).collect();
        let mut v2: Vec<u32> = (0..10).collect();
        p1.shuffle(&mut v1);
        p2.shuffle(&mut v2);
        assert_eq!(v1, v2);
    }

    #[test]
    fn zero_seed_is_reproducible() {
        let mut a = Prng::new(0);
        let mut b = Prng::new(0);
        assert_eq!(a.next(), b.next());
    }
}
