//! # PRN Numerics Core
//!
//! Deterministic numeric primitives consumed by every other layer:
//!
//! - A 64-bit LCG PRNG ([`Lcg64`]) — deterministic when seeded, explicitly
//!   **not** cryptographically secure.
//! - Deterministic Miller–Rabin primality with a process-wide cache,
//!   Sieve of Eratosthenes, and random prime generation.
//! - Montgomery modular multiplication and exponentiation, binary
//!   `mod_exp`, extended Euclid and modular inverse.
//! - SHA-256 / HMAC-SHA256 / PBKDF2 codecs, bit-exact against the
//!   published test vectors.
//!
//! All functions are pure except the prime cache, which is the single
//! piece of process-wide mutable state (mutex-guarded, content-determined,
//! resettable via [`reset_caches`] for tests).

pub mod hashing;
pub mod lcg;
pub mod modular;
pub mod montgomery;
pub mod primality;

pub use hashing::{hmac_sha256, pbkdf2_hmac_sha256, sha256, sha256_hex, CodecError, Digest32};
pub use lcg::Lcg64;
pub use modular::{ext_gcd, mod_exp, mod_exp_opt, mod_inverse, mod_mul};
pub use montgomery::Montgomery;
pub use primality::{
    generate_prime, generate_primes, is_prime, prime_cache_stats, sieve, CacheStats,
};

/// Clears all process-wide numeric state. Intended for test isolation.
pub fn reset_caches() {
    primality::reset_cache();
}
