//! # Keytriplet Identities
//!
//! Every identity owns three linked keys:
//!
//! 1. A **private key**: a normalised complex-amplitude vector over the
//!    first 256 primes, derived deterministically from
//!    `(global_seed, user_id)` through the prime-entropy hash.
//! 2. A **classical public key**: the hex SHA-256 of the private key's
//!    magnitude spectrum. It exposes no phase information.
//! 3. A **resonance key**: an attenuated projection of the private key
//!    onto a sampled prime subset, used to initialise shared session
//!    fields.
//!
//! Keys evolve in time: [`Keytriplet::evolve`] rotates every private
//! coefficient by a prime-dependent phase plus Gaussian noise and then
//! reprojects the resonance key.

pub mod entropy;
pub mod keytriplet;

pub use entropy::prime_entropy_hash;
pub use keytriplet::{KeyError, Keytriplet, PRIVATE_BASIS_SIZE};
