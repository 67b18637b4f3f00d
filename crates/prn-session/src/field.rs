//! # Resonance-Field Initialisation
//!
//! The shared field of a session couples two resonance keys through a
//! Gaussian kernel in prime space: primes close to each other exchange
//! amplitude, distant primes do not.

use prn_state::{Complex64, PrimeState, StateError};
use std::collections::{BTreeSet, HashMap};

/// Width of the resonance kernel in prime space.
const KERNEL_SIGMA: f64 = 5.0;

/// Builds the shared session field for two resonance keys.
///
/// The basis is the sorted union of both key bases. The amplitude at
/// prime p is `sum_q a(q) * b(q) * exp(-(p-q)^2 / (2*sigma^2))` over all
/// primes q of the union, normalised at the end.
///
/// # Errors
///
/// Only on internal state-construction failure.
pub fn resonance_field(
    key_a: &PrimeState,
    key_b: &PrimeState,
) -> Result<PrimeState, StateError> {
    let union: BTreeSet<u64> = key_a
        .primes()
        .iter()
        .chain(key_b.primes())
        .copied()
        .collect();
    let basis: Vec<u64> = union.into_iter().collect();

    // Indexed lookup; coefficient_of would rescan per pair.
    let coeff_map = |key: &PrimeState| -> HashMap<u64, Complex64> {
        key.primes()
            .iter()
            .copied()
            .zip(key.coeffs().iter().copied())
            .collect()
    };
    let a = coeff_map(key_a);
    let b = coeff_map(key_b);

    let two_sigma_sq = 2.0 * KERNEL_SIGMA * KERNEL_SIGMA;
    let mut coeffs = Vec::with_capacity(basis.len());
    for &p in &basis {
        let mut acc = Complex64::ZERO;
        for &q in &basis {
            let ca = a.get(&q).copied().unwrap_or(Complex64::ZERO);
            let cb = b.get(&q).copied().unwrap_or(Complex64::ZERO);
            if ca.is_zero() || cb.is_zero() {
                continue;
            }
            let distance = p as f64 - q as f64;
            let kernel = (-distance * distance / two_sigma_sq).exp();
            acc += ca * cb * kernel;
        }
        coeffs.push(acc);
    }

    let mut field = PrimeState::new(basis, coeffs)?;
    field.normalize();
    Ok(field)
}

// =============================================================================
// TESTS
// =============================================================================
