// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Returns `true` if `n` is prime.
#[must_use]
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let n = u64::from(n);
    let mut divisor = 3u64;

    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }

    true
}

/// Returns the smallest prime that is `>= n`.
///
/// Returns `None` if there is no such prime representable as `u32`.
///
/// Useful to pick a table size:
///
/// ```
/// # use maglev_table::util::next_prime;
/// assert_eq!(Some(4_099), next_prime(4_097));
/// assert_eq!(Some(7), next_prime(7));
/// ```
#[must_use]
pub fn next_prime(n: u32) -> Option<u32> {
    (n..=u32::MAX).find(|&candidate| is_prime(candidate))
}
