//! Prime bucket-count selection.
//!
//! Bucket indices are `hash % capacity`. A prime modulus keeps keys whose
//! hashes share a common factor with the capacity (powers of two in
//! particular) from piling into the same few buckets.

use crate::error::SizingError;

/// Largest capacity the sizer will produce. This value is itself prime.
pub const MAX_PRIME: usize = 1_301_081;

/// Capacity requested by `HashTable::new`.
pub const DEFAULT_CAPACITY: usize = 101;

/// Returns the largest prime `<= n`.
///
/// Requests above [`MAX_PRIME`] or at most 1 are rejected with a
/// [`SizingError`]; a table is never built with zero buckets.
pub fn prime_below(n: usize) -> Result<usize, SizingError> {
    if n > MAX_PRIME {
        let err = SizingError::TooLarge {
            requested: n,
            max: MAX_PRIME,
        };
        tracing::warn!(requested = n, "{err}");
        return Err(err);
    }
    if n == MAX_PRIME {
        return Ok(MAX_PRIME);
    }
    if n <= 1 {
        let err = SizingError::TooSmall { requested: n };
        tracing::warn!(requested = n, "{err}");
        return Err(err);
    }

    // 2 <= n < MAX_PRIME
    let sieve = sieve(n + 1);
    let mut candidate = n;
    while candidate > 2 {
        if sieve[candidate] {
            return Ok(candidate);
        }
        candidate -= 1;
    }
    Ok(2)
}

/// Capacity to rehash into once `current` buckets are overfull.
///
/// Doubles and rounds down to a prime, clamping the request at [`MAX_PRIME`]
/// so the sizer is never asked for an unsupported size. Once `current` is
/// `MAX_PRIME` the table stops growing and this returns `current`.
pub fn grow_capacity(current: usize) -> usize {
    let request = current.saturating_mul(2).min(MAX_PRIME);
    prime_below(request).unwrap_or(current)
}

/// Trial-division primality check.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

// Index i is true iff i is prime, for i in [0, len).
fn sieve(len: usize) -> Vec<bool> {
    let mut primes = vec![true; len];
    for slot in primes.iter_mut().take(2) {
        *slot = false;
    }
    let mut i = 2;
    while i * i < len {
        if primes[i] {
            let mut j = i + i;
            while j < len {
                primes[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    primes
}
