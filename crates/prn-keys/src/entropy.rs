//! # Prime-Entropy Hash
//!
//! A 32-byte digest of `(global_seed, user_id)` that seeds private-key
//! amplitudes. SHA-256 provides the base digest; three prime-indexed
//! mixing rounds then fold every byte with positions selected by the
//! first sixteen primes.

use prn_numerics::sha256;

/// Number of mixing rounds applied on top of SHA-256.
const MIXING_ROUNDS: usize = 3;

/// First 16 primes, the mixing strides.
const MIXING_PRIMES: [u64; 16] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// 32-byte prime-entropy digest of `global_seed || "||" || user_id`.
#[must_use]
pub fn prime_entropy_hash(global_seed: &str, user_id: &str) -> [u8; 32] {
    let mut material = Vec::with_capacity(global_seed.len() + user_id.len() + 2);
    material.extend_from_slice(global_seed.as_bytes());
    material.extend_from_slice(b"||");
    material.extend_from_slice(user_id.as_bytes());

    let mut digest = sha256(&material);
    let len = digest.len();
    for _ in 0..MIXING_ROUNDS {
        for i in 0..len {
            for &p in &MIXING_PRIMES {
                let j = (i * p as usize) % len;
                digest[i] ^= digest[j];
                digest[i] = digest[i].wrapping_mul((p % 256) as u8);
            }
        }
    }
    digest
}

// =============================================================================
// TESTS
// =============================================================================
