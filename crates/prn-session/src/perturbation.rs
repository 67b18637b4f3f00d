//! # Message Perturbation
//!
//! Text is carried through the field as phase modulations. A session-wide
//! [`PrimeMapping`] assigns three primes to every byte value; encoding a
//! message marks those primes as targets with unit-magnitude complex
//! modulations whose phase encodes the byte.

use prn_numerics::generate_primes;
use prn_state::Complex64;
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{PI, TAU};

/// Size of the byte-to-prime mapping table.
const MAPPING_PRIMES: usize = 1024;

/// Primes assigned per byte value.
const PRIMES_PER_BYTE: usize = 3;

/// Byte-value to prime-triple mapping, built once per session.
#[derive(Debug, Clone)]
pub struct PrimeMapping {
    primes: Vec<u64>,
}

impl Default for PrimeMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimeMapping {
    /// Builds the mapping over the first 1024 primes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            primes: generate_primes(MAPPING_PRIMES),
        }
    }

    /// The three primes carrying byte value `b`.
    #[must_use]
    pub fn primes_for_byte(&self, b: u8) -> [u64; PRIMES_PER_BYTE] {
        let base = PRIMES_PER_BYTE * b as usize;
        [
            self.primes[base % MAPPING_PRIMES],
            self.primes[(base + 1) % MAPPING_PRIMES],
            self.primes[(base + 2) % MAPPING_PRIMES],
        ]
    }
}

/// One outbound message, encoded as phase modulations on target primes.
#[derive(Debug, Clone)]
pub struct MessagePerturbation {
    targets: BTreeSet<u64>,
    modulations: HashMap<u64, Complex64>,
    source: String,
}

impl MessagePerturbation {
    /// Encodes `text` against `mapping`.
    ///
    /// For the byte at position k of L, each of its three primes p_m
    /// (m in 0..3) receives the unit-magnitude modulation with phase
    /// `(b/255)*2*pi + (m/L)*pi`. A prime targeted by several bytes keeps
    /// the modulation of the last byte that reached it.
    #[must_use]
    pub fn encode(mapping: &PrimeMapping, text: &str) -> Self {
        let bytes = text.as_bytes();
        let len = bytes.len().max(1) as f64;
        let mut targets = BTreeSet::new();
        let mut modulations = HashMap::new();

        for &b in bytes {
            for (m, p) in mapping.primes_for_byte(b).into_iter().enumerate() {
                let theta = (b as f64 / 255.0) * TAU + (m as f64 / len) * PI;
                targets.insert(p);
                modulations.insert(p, Complex64::exp_i(theta));
            }
        }

        Self {
            targets,
            modulations,
            source: text.to_string(),
        }
    }

    /// The targeted primes, ascending.
    pub fn targets(&self) -> impl Iterator<Item = u64> + '_ {
        self.targets.iter().copied()
    }

    /// Modulation for `prime`, if targeted.
    #[must_use]
    pub fn modulation(&self, prime: u64) -> Option<Complex64> {
        self.modulations.get(&prime).copied()
    }

    /// The original text this perturbation was encoded from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of distinct targeted primes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the message encoded to nothing (empty text).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
