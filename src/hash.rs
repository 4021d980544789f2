// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Output precision of the node hashes in bits
///
/// Node hashes are in `[0, 2^HASH_PRECISION)`.
pub const HASH_PRECISION: u32 = 14;

/// Multiplier of the offset hash (Knuth's golden ratio constant)
const OFFSET_MULTIPLIER: u32 = 2_654_435_769;

/// Multiplier of the skip hash
const SKIP_MULTIPLIER: u32 = 1_654_435_769;

/// Multiplicative hash, keeping the top `HASH_PRECISION` bits of `s * k mod 2^32`.
#[inline]
fn multiplicative(s: u32, k: u32) -> u32 {
    s.wrapping_mul(k) >> (32 - HASH_PRECISION)
}

/// Hash used to derive the permutation offset of the node with 1-based id `k`.
#[must_use]
#[inline]
pub fn hash1(k: u32) -> u32 {
    multiplicative(OFFSET_MULTIPLIER, k)
}

/// Hash used to derive the permutation skip of the node with 1-based id `k`.
#[must_use]
#[inline]
pub fn hash2(k: u32) -> u32 {
    multiplicative(SKIP_MULTIPLIER, k)
}

/// Hashes a routing key.
#[must_use]
pub fn hash64(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}
