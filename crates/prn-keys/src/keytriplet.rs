//! # Keytriplet
//!
//! Generation, projection and time evolution of the three linked keys.

use crate::entropy::prime_entropy_hash;
use prn_numerics::{generate_primes, sha256_hex, Lcg64};
use prn_state::{Complex64, PrimeState, StateError};
use std::f64::consts::TAU;
use std::fmt::Write as _;
use thiserror::Error;

/// Size of the private-key prime basis.
pub const PRIVATE_BASIS_SIZE: usize = 256;

/// Base selection probability for the resonance projection.
const SELECT_BASE: f64 = 0.6;

/// Index decay scale of the selection probability, as a fraction of n.
const SELECT_DECAY: f64 = 0.3;

/// Minimum fraction of the private basis kept by the projection.
const SELECT_FLOOR: f64 = 0.3;

/// Attenuation prefactor of the projection.
const ATTENUATION_BASE: f64 = 0.7;

/// Log-scale divisor of the attenuation factor.
const ATTENUATION_SCALE: f64 = 10.0;

/// Evolution constant kappa; phases advance by `2*pi*log_p(kappa)*dt`.
const KAPPA: f64 = 2.718;

/// Gaussian phase-noise scale per unit dt.
const NOISE_SCALE: f64 = 0.01;

/// Clip bound for the raw Gaussian noise samples.
const NOISE_CLIP: f64 = 3.0;

/// Keytriplet failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The underlying state algebra rejected a basis.
    #[error(transparent)]
    State(#[from] StateError),
}

/// The three linked keys of one identity.
#[derive(Debug, Clone)]
pub struct Keytriplet {
    user_id: String,
    private_key: PrimeState,
    classical_public_key: String,
    resonance_key: PrimeState,
    rng: Lcg64,
}

impl Keytriplet {
    /// Derives the triplet for `(global_seed, user_id)`.
    ///
    /// Deterministic: the same pair yields byte-identical keys, including
    /// the projection's sampled phases (the projection RNG is seeded from
    /// the entropy hash).
    ///
    /// # Errors
    ///
    /// Only on internal state-construction failure; well-formed inputs
    /// always succeed.
    pub fn generate(global_seed: &str, user_id: &str) -> Result<Self, KeyError> {
        let digest = prime_entropy_hash(global_seed, user_id);
        let primes = generate_primes(PRIVATE_BASIS_SIZE);

        // Two signed amplitudes per prime from consecutive big-endian byte
        // pairs of the digest, wrapping around its 32 bytes.
        let mut coeffs = Vec::with_capacity(PRIVATE_BASIS_SIZE);
        for i in 0..PRIVATE_BASIS_SIZE {
            let re = signed_amplitude(&digest, 2 * i);
            let im = signed_amplitude(&digest, 2 * i + 2);
            coeffs.push(Complex64::new(re, im));
        }
        let mut private_key = PrimeState::new(primes, coeffs)?;
        private_key.normalize();

        let classical_public_key = classical_key_of(&private_key);

        // Projection phases come from an RNG bound to the identity.
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let mut rng = Lcg64::new(u64::from_be_bytes(seed_bytes));
        let resonance_key = project_resonance(&private_key, &mut rng)?;

        tracing::debug!(user_id, "keytriplet generated");
        Ok(Self {
            user_id: user_id.to_string(),
            private_key,
            classical_public_key,
            resonance_key,
            rng,
        })
    }

    /// The identity this triplet belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The private prime-amplitude key.
    #[must_use]
    pub fn private_key(&self) -> &PrimeState {
        &self.private_key
    }

    /// The classical public key: lowercase hex SHA-256 of the magnitude
    /// spectrum, joined with `,` under `f64`'s shortest-roundtrip
    /// formatting. The formatting is part of the key.
    #[must_use]
    pub fn classical_public_key(&self) -> &str {
        &self.classical_public_key
    }

    /// The resonance projection used for shared-field initialisation.
    #[must_use]
    pub fn resonance_key(&self) -> &PrimeState {
        &self.resonance_key
    }

    /// Advances the private key by `dt` and reprojects the resonance key.
    ///
    /// Each coefficient rotates by `2*pi*log_p(kappa)*dt` plus clipped
    /// Gaussian noise scaled by `0.01*dt`. Rotation preserves magnitudes,
    /// so the classical public key is unchanged.
    ///
    /// # Errors
    ///
    /// Only on internal state-construction failure.
    pub fn evolve(&mut self, dt: f64) -> Result<(), KeyError> {
        let kappa_ln = KAPPA.ln();
        let Self {
            private_key, rng, ..
        } = self;
        for i in 0..private_key.len() {
            let p = private_key.primes()[i];
            let log_p_kappa = kappa_ln / (p as f64).ln();
            let noise = rng.next_gaussian().clamp(-NOISE_CLIP, NOISE_CLIP) * NOISE_SCALE * dt;
            let theta = TAU * log_p_kappa * dt + noise;
            let c = private_key.coeffs()[i];
            private_key.coeffs_mut()[i] = c * Complex64::exp_i(theta);
        }
        self.resonance_key = project_resonance(&self.private_key, &mut self.rng)?;
        Ok(())
    }
}

/// One signed amplitude in [-1, 1] from a big-endian byte pair at `offset`.
fn signed_amplitude(digest: &[u8; 32], offset: usize) -> f64 {
    let hi = digest[offset % 32];
    let lo = digest[(offset + 1) % 32];
    let raw = u16::from_be_bytes([hi, lo]);
    (raw as f64 / u16::MAX as f64) * 2.0 - 1.0
}

/// Classical public key of a private state.
fn classical_key_of(private_key: &PrimeState) -> String {
    let mut spectrum = String::new();
    for (i, c) in private_key.coeffs().iter().enumerate() {
        if i > 0 {
            spectrum.push(',');
        }
        let _ = write!(spectrum, "{}", c.magnitude());
    }
    sha256_hex(spectrum.as_bytes())
}

/// The symbolic projection P: sampled subset, attenuated magnitudes,
/// randomised phases, renormalised.
fn project_resonance(
    private_key: &PrimeState,
    rng: &mut Lcg64,
) -> Result<PrimeState, KeyError> {
    let n = private_key.len();
    let mut allowed = vec![false; n];
    let mut selected = 0usize;
    for (i, slot) in allowed.iter_mut().enumerate() {
        let probability = SELECT_BASE * (-(i as f64) / (SELECT_DECAY * n as f64)).exp();
        if rng.next_f64() < probability {
            *slot = true;
            selected += 1;
        }
    }

    // Keep at least 30% of the basis, topping up from the lowest indices.
    let floor = (SELECT_FLOOR * n as f64).ceil() as usize;
    if selected < floor {
        for slot in allowed.iter_mut() {
            if selected >= floor {
                break;
            }
            if !*slot {
                *slot = true;
                selected += 1;
            }
        }
    }

    let mut coeffs = Vec::with_capacity(n);
    for (i, &p) in private_key.primes().iter().enumerate() {
        if allowed[i] {
            let c = private_key.coeffs()[i];
            let attenuation = ATTENUATION_BASE * (-(p as f64).ln() / ATTENUATION_SCALE).exp();
            let phase_shift = rng.next_range(0.0, TAU);
            coeffs.push(Complex64::from_polar(
                c.magnitude() * attenuation,
                c.arg() + phase_shift,
            ));
        } else {
            coeffs.push(Complex64::ZERO);
        }
    }

    let mut projected = PrimeState::new(private_key.primes().to_vec(), coeffs)?;
    projected.normalize();
    Ok(projected)
}

// =============================================================================
// TESTS
// =============================================================================
