//! Linear-congruential pseudo-random source

use serde::{Deserialize, Serialize};

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;

/// Modulus of the generator; every value is `state / LCG_MODULUS`
pub const LCG_MODULUS: u64 = 233_280;

/// Advance the generator by one step
///
/// Returns the drawn value in `[0, 1)` and the next state.
pub fn next_random(state: u64) -> (f64, u64) {
    let next = (state % LCG_MODULUS * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
    (next as f64 / LCG_MODULUS as f64, next)
}

/// Explicit generator state threaded through synthesizers
///
/// A plain `Copy` value: callers own it, pass it by `&mut`, and can
/// snapshot or restore it at will.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a generator from a raw seed
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Create a generator seeded from a symbol and salt
    pub fn for_symbol(symbol: &str, salt: u64) -> Self {
        Self::new(super::seed(symbol, salt))
    }

    /// Current internal state
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Draw the next value in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        let (value, next) = next_random(self.state);
        self.state = next;
        value
    }

    /// Draw a value uniformly in `[lo, hi)`
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Draw an index in `[0, len)`; returns 0 for an empty range
    pub fn index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Pick one element uniformly; `None` for an empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.index(items.len()))
    }

    /// Draw `n` lowercase hex digits
    pub fn hex_digits(&mut self, n: usize) -> String {
        (0..n)
            .map(|_| {
                let digit = self.index(16) as u32;
                char::from_digit(digit, 16).unwrap_or('0')
            })
            .collect()
    }
}
