//! Deterministic generator module
//!
//! Seeded pseudo-random source standing in for unavailable on-chain feeds.
//! Output is a pure function of (symbol, salt, time bucket).

mod bucket;
mod rng;

pub use bucket::TimeBucket;
pub use rng::{next_random, SeededRng, LCG_MODULUS};

/// Hash a symbol into a non-negative seed component.
///
/// Rolling `hash = c + ((hash << 5) - hash)` over UTF-16 code units in
/// wrapping 32-bit arithmetic, absolute value taken at the end.
pub fn symbol_hash(symbol: &str) -> u64 {
    let hash = symbol.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    u64::from(hash.unsigned_abs())
}

/// Seed for a symbol combined with a salt
pub fn seed(symbol: &str, salt: u64) -> u64 {
    symbol_hash(symbol).wrapping_add(salt)
}
