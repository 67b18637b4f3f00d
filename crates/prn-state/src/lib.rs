//! # Prime-State Algebra
//!
//! A [`PrimeState`] is an ordered sequence of distinct primes paired with
//! complex amplitudes. It is the common value type of the key layer (private
//! and resonance keys) and the session layer (shared fields).
//!
//! The algebra is small: normalisation onto the unit sphere, normalised
//! Shannon entropy of the probability vector, and coefficient access by
//! prime. Everything heavier lives with the consumers.

pub mod complex;
pub mod prime_state;

pub use complex::Complex64;
pub use prime_state::{PrimeState, StateError};
