//! # PrimeState
//!
//! Ordered distinct primes with parallel complex coefficients. The basis
//! order is stable: operations never reorder or deduplicate after
//! construction, so coefficient index i always refers to `primes[i]`.

use crate::complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Norm below which a state is treated as all-zero and left alone.
const ZERO_NORM: f64 = 1e-300;

/// Construction errors for [`PrimeState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Primes and coefficients differ in length.
    #[error("basis/coefficient length mismatch: {primes} primes, {coeffs} coefficients")]
    LengthMismatch { primes: usize, coeffs: usize },

    /// The same prime appears twice in the basis.
    #[error("duplicate prime in basis: {0}")]
    DuplicatePrime(u64),

    /// A composite was offered as a basis prime.
    #[error("{0} is not prime")]
    NotPrime(u64),
}

/// A complex-amplitude vector over a prime-indexed basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimeState {
    primes: Vec<u64>,
    coeffs: Vec<Complex64>,
}

impl PrimeState {
    /// Creates a state from parallel prime/coefficient sequences.
    ///
    /// # Errors
    ///
    /// Rejects mismatched lengths, duplicate primes, and composites: every
    /// value is primality-checked before admission to the basis. Basis
    /// order is preserved as given.
    pub fn new(primes: Vec<u64>, coeffs: Vec<Complex64>) -> Result<Self, StateError> {
        if primes.len() != coeffs.len() {
            return Err(StateError::LengthMismatch {
                primes: primes.len(),
                coeffs: coeffs.len(),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(primes.len());
        for &p in &primes {
            if !seen.insert(p) {
                return Err(StateError::DuplicatePrime(p));
            }
            if !prn_numerics::is_prime(p) {
                return Err(StateError::NotPrime(p));
            }
        }
        Ok(Self { primes, coeffs })
    }

    /// Creates a zero-amplitude state over the given basis.
    ///
    /// # Errors
    ///
    /// Rejects duplicate primes.
    pub fn from_primes(primes: Vec<u64>) -> Result<Self, StateError> {
        let coeffs = vec![Complex64::ZERO; primes.len()];
        Self::new(primes, coeffs)
    }

    /// Number of basis primes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primes.len()
    }

    /// True for an empty basis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// The basis primes, in basis order.
    #[must_use]
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// The coefficients, parallel to [`Self::primes`].
    #[must_use]
    pub fn coeffs(&self) -> &[Complex64] {
        &self.coeffs
    }

    /// Mutable coefficients. The basis itself stays fixed.
    pub fn coeffs_mut(&mut self) -> &mut [Complex64] {
        &mut self.coeffs
    }

    /// Coefficient of `prime`, or zero when the prime is not in the basis.
    #[must_use]
    pub fn coefficient_of(&self, prime: u64) -> Complex64 {
        self.primes
            .iter()
            .position(|&p| p == prime)
            .map_or(Complex64::ZERO, |i| self.coeffs[i])
    }

    /// Sets the coefficient of `prime` if it is in the basis.
    /// Returns whether a coefficient was written.
    pub fn set_coefficient(&mut self, prime: u64, value: Complex64) -> bool {
        if let Some(i) = self.primes.iter().position(|&p| p == prime) {
            self.coeffs[i] = value;
            true
        } else {
            false
        }
    }

    /// `sqrt(sum |c_i|^2)`.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.coeffs
            .iter()
            .map(|c| c.magnitude_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// Scales every coefficient so the norm becomes 1.
    /// A (numerically) zero state is left untouched.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm <= ZERO_NORM {
            return;
        }
        let inv = 1.0 / norm;
        for c in &mut self.coeffs {
            *c = c.scale(inv);
        }
    }

    /// Probability vector `|c_i|^2 / sum`, in basis order.
    /// Empty when the state is all-zero.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        let total: f64 = self.coeffs.iter().map(|c| c.magnitude_squared()).sum();
        if total <= ZERO_NORM {
            return Vec::new();
        }
        self.coeffs
            .iter()
            .map(|c| c.magnitude_squared() / total)
            .collect()
    }

    /// Normalised Shannon entropy of the probability vector, in [0, 1].
    ///
    /// Plain Shannon entropy in bits divided by `log2(n)`; a single-prime
    /// basis or an all-zero state reports 0.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        if self.primes.len() < 2 {
            return 0.0;
        }
        let probs = self.probabilities();
        if probs.is_empty() {
            return 0.0;
        }
        let bits: f64 = probs
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.log2())
            .sum();
        bits / (self.primes.len() as f64).log2()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(pairs: &[(u64, f64, f64)]) -> PrimeState {
        let primes = pairs.iter().map(|&(p, _, _)| p).collect();
        let coeffs = pairs
            .iter()
            .map(|&(_, re, im)| Complex64::new(re, im))
            .collect();
        PrimeState::new(primes, coeffs).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let err = PrimeState::new(vec![2, 3], vec![Complex64::ONE]).unwrap_err();
        assert!(matches!(err, StateError::LengthMismatch { primes: 2, coeffs: 1 }));
    }

    #[test]
    fn test_rejects_duplicate_primes() {
        let err = PrimeState::from_primes(vec![2, 3, 2]).unwrap_err();
        assert_eq!(err, StateError::DuplicatePrime(2));
    }

    #[test]
    fn test_rejects_composites() {
        let err = PrimeState::from_primes(vec![2, 3, 9]).unwrap_err();
        assert_eq!(err, StateError::NotPrime(9));
    }

    #[test]
    fn test_normalize_unit_norm() {
        let mut s = state(&[(2, 3.0, 0.0), (3, 0.0, 4.0)]);
        s.normalize();
        assert!((s.norm() - 1.0).abs() < 1e-9);
        assert!((s.coeffs()[0].re - 0.6).abs() < 1e-12);
        assert!((s.coeffs()[1].im - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_state_noop() {
        let mut s = PrimeState::from_primes(vec![2, 3, 5]).unwrap();
        s.normalize();
        assert_eq!(s.norm(), 0.0);
    }

    #[test]
    fn test_coefficient_of_absent_prime_is_zero() {
        let s = state(&[(2, 1.0, 0.0)]);
        assert_eq!(s.coefficient_of(7), Complex64::ZERO);
        assert_eq!(s.coefficient_of(2), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_entropy_uniform_is_one() {
        let mut s = state(&[(2, 1.0, 0.0), (3, 1.0, 0.0), (5, 1.0, 0.0), (7, 1.0, 0.0)]);
        s.normalize();
        assert!((s.entropy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_concentrated_is_zero() {
        let s = state(&[(2, 1.0, 0.0), (3, 0.0, 0.0), (5, 0.0, 0.0)]);
        assert!(s.entropy().abs() < 1e-12);
    }

    #[test]
    fn test_entropy_ignores_phase() {
        let mut a = state(&[(2, 0.5, 0.0), (3, 0.7, 0.0)]);
        let mut b = state(&[(2, 0.0, 0.5), (3, -0.7, 0.0)]);
        a.normalize();
        b.normalize();
        assert!((a.entropy() - b.entropy()).abs() < 1e-12);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = state(&[(2, 1.0, 0.0)]);
        let copied = original.clone();
        original.coeffs_mut()[0] = Complex64::ZERO;
        assert_eq!(copied.coefficient_of(2), Complex64::new(1.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_unit(res in proptest::collection::vec(-10.0f64..10.0, 1..40)) {
            let primes = prn_numerics::generate_primes(res.len());
            let coeffs: Vec<Complex64> =
                res.iter().map(|&r| Complex64::new(r, r * 0.5)).collect();
            let mut s = PrimeState::new(primes, coeffs).unwrap();
            if s.norm() > 1e-9 {
                s.normalize();
                prop_assert!((s.norm() - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_entropy_in_unit_interval(res in proptest::collection::vec(-5.0f64..5.0, 2..30)) {
            let primes = prn_numerics::generate_primes(res.len());
            let coeffs: Vec<Complex64> =
                res.iter().map(|&r| Complex64::new(r, -r)).collect();
            let s = PrimeState::new(primes, coeffs).unwrap();
            let e = s.entropy();
            prop_assert!((0.0..=1.0 + 1e-12).contains(&e));
        }
    }
}
