//! # Primality Testing
//!
//! Deterministic Miller–Rabin with the published witness sets: `{2, 7, 61}`
//! decides every n < 2^32, and the first twelve primes decide every 64-bit n.
//! Trial division by the first fifty primes runs first; results memoise in a
//! process-wide cache.
//!
//! The cache is the only shared mutable state in the numerics layer. Answers
//! are content-determined, so duplicate work across callers is safe; the
//! mutex only protects the map itself.

use crate::lcg::Lcg64;
use crate::modular::{mod_exp, mod_mul};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, OnceLock};

/// First 50 primes, used for trial division before Miller–Rabin.
const SMALL_PRIMES: [u64; 50] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229,
];

/// Deterministic witness set for n < 2^32.
const WITNESSES_32: [u64; 3] = [2, 7, 61];

/// Deterministic witness set for all 64-bit n.
const WITNESSES_64: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Attempt budget for random prime generation before giving up.
const MAX_GENERATION_ATTEMPTS: u32 = 100_000;

// =============================================================================
// MILLER-RABIN
// =============================================================================

/// One Miller–Rabin round: is `n` a strong probable prime to base `a`?
fn strong_probable_prime(n: u64, d: u64, r: u32, a: u64) -> bool {
    let a = a % n;
    if a == 0 {
        return true;
    }
    let mut x = mod_exp(a, d, n);
    if x == 1 || x == n - 1 {
        return true;
    }
    for _ in 1..r {
        x = mod_mul(x, x, n);
        if x == n - 1 {
            return true;
        }
    }
    false
}

/// Deterministic Miller–Rabin over a witness set. `n` must be odd and >= 3.
fn miller_rabin(n: u64, witnesses: &[u64]) -> bool {
    // n - 1 = 2^r * d with d odd.
    let r = (n - 1).trailing_zeros();
    let d = (n - 1) >> r;
    witnesses
        .iter()
        .all(|&a| strong_probable_prime(n, d, r, a))
}

/// Primality without consulting the cache.
fn is_prime_uncached(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &SMALL_PRIMES {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    if n < 1 << 32 {
        miller_rabin(n, &WITNESSES_32)
    } else {
        miller_rabin(n, &WITNESSES_64)
    }
}

// =============================================================================
// PRIME CACHE
// =============================================================================

#[derive(Debug, Default)]
struct PrimeCache {
    results: HashMap<u64, bool>,
    known_primes: BTreeSet<u64>,
    hits: u64,
    misses: u64,
}

/// Snapshot of the cache's performance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the full test.
    pub misses: u64,
    /// Distinct values with a memoised answer.
    pub cached_results: usize,
    /// Distinct values known to be prime.
    pub known_primes: usize,
}

fn cache() -> &'static Mutex<PrimeCache> {
    static CACHE: OnceLock<Mutex<PrimeCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(PrimeCache::default()))
}

/// Deterministic primality test with process-wide memoisation.
#[must_use]
pub fn is_prime(n: u64) -> bool {
    {
        let mut guard = cache().lock().expect("prime cache poisoned");
        if let Some(&known) = guard.results.get(&n) {
            guard.hits += 1;
            return known;
        }
        guard.misses += 1;
    }
    // The test runs outside the lock; a racing duplicate computes the same
    // answer, so last-writer-wins is harmless.
    let result = is_prime_uncached(n);
    let mut guard = cache().lock().expect("prime cache poisoned");
    guard.results.insert(n, result);
    if result {
        guard.known_primes.insert(n);
    }
    result
}

/// Performance counters for the process-wide cache.
#[must_use]
pub fn prime_cache_stats() -> CacheStats {
    let guard = cache().lock().expect("prime cache poisoned");
    CacheStats {
        hits: guard.hits,
        misses: guard.misses,
        cached_results: guard.results.len(),
        known_primes: guard.known_primes.len(),
    }
}

/// Clears the process-wide cache. Test isolation only.
pub fn reset_cache() {
    let mut guard = cache().lock().expect("prime cache poisoned");
    *guard = PrimeCache::default();
}

// =============================================================================
// SIEVE & GENERATION
// =============================================================================

/// All primes `<= limit` by the Sieve of Eratosthenes.
#[must_use]
pub fn sieve(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let limit = limit as usize;
    let mut composite = vec![false; limit + 1];
    let mut primes = Vec::new();
    for n in 2..=limit {
        if !composite[n] {
            primes.push(n as u64);
            let mut multiple = n * n;
            while multiple <= limit {
                composite[multiple] = true;
                multiple += n;
            }
        }
    }
    primes
}

/// The first `count` primes, in order.
#[must_use]
pub fn generate_primes(count: usize) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    // Rosser bound p_n < n(ln n + ln ln n) for n >= 6, padded slightly.
    let mut bound = if count < 6 {
        16
    } else {
        let n = count as f64;
        (n * (n.ln() + n.ln().ln()) * 1.2) as u64
    };
    loop {
        let primes = sieve(bound);
        if primes.len() >= count {
            return primes[..count].to_vec();
        }
        bound *= 2;
    }
}

/// Samples a random prime with bit length in `[min_bits, max_bits]`.
///
/// Odd candidates are drawn from the LCG and tested deterministically.
/// Returns `None` for a malformed bit range or when the attempt budget is
/// exhausted (practically unreachable for any sane range).
#[must_use]
pub fn generate_prime(min_bits: u32, max_bits: u32, rng: &mut Lcg64) -> Option<u64> {
    if min_bits < 2 || max_bits < min_bits || max_bits > 63 {
        return None;
    }
    let lo = 1u64 << (min_bits - 1);
    let hi = (1u64 << max_bits) - 1;
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate = (lo + rng.next_below(hi - lo + 1)) | 1;
        if candidate <= hi && is_prime(candidate) {
            return Some(candidate);
        }
    }
    tracing::warn!(min_bits, max_bits, "prime generation attempt budget exhausted");
    None
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_values() {
        let expected = [
            (0u64, false),
            (1, false),
            (2, true),
            (3, true),
            (4, false),
            (5, true),
            (6, false),
            (7, true),
            (8, false),
            (9, false),
            (10, false),
            (11, true),
            (12, false),
            (13, true),
        ];
        for (n, want) in expected {
            assert_eq!(is_prime(n), want, "n = {n}");
        }
    }

    #[test]
    fn test_range_2_to_47() {
        let primes: Vec<u64> = (2..=47).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
    }

    #[test]
    fn test_carmichael_numbers_rejected() {
        for n in [561u64, 1105, 1729, 2465, 2821, 6601, 8911] {
            assert!(!is_prime(n), "Carmichael number {n} passed");
        }
    }

    #[test]
    fn test_large_known_primes() {
        assert!(is_prime(4_294_967_291)); // largest 32-bit prime
        assert!(is_prime(2_305_843_009_213_693_951)); // 2^61 - 1
        assert!(is_prime(18_446_744_073_709_551_557)); // largest 64-bit prime
    }

    #[test]
    fn test_large_composites() {
        assert!(!is_prime(4_294_967_295)); // 2^32 - 1 = 3·5·17·257·65537
        assert!(!is_prime(2_305_843_009_213_693_953));
        // Product of two close 31-bit primes.
        assert!(!is_prime(2_147_483_647u64 * 2_147_483_629));
    }

    #[test]
    fn test_matches_sieve() {
        let sieved: BTreeSet<u64> = sieve(10_000).into_iter().collect();
        for n in 0..=10_000u64 {
            assert_eq!(is_prime(n), sieved.contains(&n), "n = {n}");
        }
    }

    #[test]
    fn test_sieve_edges() {
        assert!(sieve(0).is_empty());
        assert!(sieve(1).is_empty());
        assert_eq!(sieve(2), [2]);
        assert_eq!(sieve(30), [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn test_generate_primes_counts() {
        assert!(generate_primes(0).is_empty());
        assert_eq!(generate_primes(1), [2]);
        assert_eq!(generate_primes(5), [2, 3, 5, 7, 11]);
        let primes = generate_primes(1024);
        assert_eq!(primes.len(), 1024);
        assert_eq!(primes[0], 2);
        assert_eq!(primes[999], 7919); // the 1000th prime
        assert!(primes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_generate_prime_respects_bits() {
        let mut rng = Lcg64::new(123);
        for _ in 0..20 {
            let p = generate_prime(16, 20, &mut rng).unwrap();
            assert!(is_prime(p));
            let bits = 64 - p.leading_zeros();
            assert!((16..=20).contains(&bits), "{p} has {bits} bits");
        }
    }

    #[test]
    fn test_generate_prime_rejects_bad_ranges() {
        let mut rng = Lcg64::default();
        assert!(generate_prime(0, 8, &mut rng).is_none());
        assert!(generate_prime(12, 8, &mut rng).is_none());
        assert!(generate_prime(8, 64, &mut rng).is_none());
    }

    #[test]
    fn test_cache_counters_move() {
        reset_cache();
        let before = prime_cache_stats();
        is_prime(1_000_003);
        is_prime(1_000_003);
        let after = prime_cache_stats();
        assert!(after.misses > before.misses);
        assert!(after.hits > before.hits);
        assert!(after.known_primes >= 1);
    }

    proptest! {
        #[test]
        fn prop_agrees_with_trial_division(n in 0u64..100_000) {
            let reference = n >= 2 && (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0);
            prop_assert_eq!(is_prime(n), reference);
        }

        #[test]
        fn prop_products_are_composite(a in 2u64..1 << 31, b in 2u64..1 << 31) {
            prop_assert!(!is_prime(a * b));
        }
    }
}
