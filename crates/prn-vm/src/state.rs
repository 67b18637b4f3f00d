//! # VM State
//!
//! Per-prime oscillators (amplitude + phase), the named register file,
//! the entanglement list, global time, and the decaying entropy model
//! driving `EVOLVE`/`ENTROPY`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

/// Global-time step applied by `TICK`.
pub const TICK_DT: f64 = 0.01;

/// Initial model entropy.
const ENTROPY_INITIAL: f64 = 1.0;

/// Decay rate of the model entropy over elapsed evolution time.
const ENTROPY_LAMBDA: f64 = 0.1;

// =============================================================================
// OSCILLATORS
// =============================================================================

/// One prime-indexed oscillator.
///
/// Amplitude clamps to [0, 1] and phase reduces mod 2*pi on every write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Oscillator {
    amplitude: f64,
    phase: f64,
}

impl Oscillator {
    /// Current amplitude in [0, 1].
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Current phase in [0, 2*pi).
    #[must_use]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Writes the amplitude, clamping to [0, 1].
    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Writes the phase, reducing mod 2*pi.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(TAU);
    }

    /// Adds to the phase, reducing mod 2*pi.
    pub fn advance_phase(&mut self, delta: f64) {
        self.set_phase(self.phase + delta);
    }
}

// =============================================================================
// REGISTERS
// =============================================================================

/// Advisory register type tag. Not enforced on arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RegisterKind {
    #[default]
    General,
    Coherence,
    Amplitude,
    Phase,
    Entropy,
    Probability,
    Success,
    Count,
    Random,
}

/// One named register.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Register {
    /// Current value.
    pub value: f64,
    /// Advisory tag from the most recent writer.
    pub kind: RegisterKind,
}

// =============================================================================
// VM STATE
// =============================================================================

/// The mutable machine state an engine owns exclusively.
#[derive(Debug, Default)]
pub struct VmState {
    oscillators: BTreeMap<u64, Oscillator>,
    registers: HashMap<String, Register>,
    entanglements: Vec<(u64, u64)>,
    global_time: f64,
    entropy: f64,
    entropy_elapsed: f64,
}

impl VmState {
    /// Fresh state: no oscillators, no registers, initial entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entropy: ENTROPY_INITIAL,
            ..Self::default()
        }
    }

    /// Oscillator for `prime`, created silent (zero amplitude) on first use.
    pub fn oscillator_mut(&mut self, prime: u64) -> &mut Oscillator {
        self.oscillators.entry(prime).or_default()
    }

    /// Read-only oscillator access.
    #[must_use]
    pub fn oscillator(&self, prime: u64) -> Option<&Oscillator> {
        self.oscillators.get(&prime)
    }

    /// Amplitude of `prime`, zero when the oscillator does not exist.
    #[must_use]
    pub fn amplitude(&self, prime: u64) -> f64 {
        self.oscillators.get(&prime).map_or(0.0, Oscillator::amplitude)
    }

    /// Phase of `prime`, zero when the oscillator does not exist.
    #[must_use]
    pub fn phase(&self, prime: u64) -> f64 {
        self.oscillators.get(&prime).map_or(0.0, Oscillator::phase)
    }

    /// Active primes in ascending order.
    pub fn active_primes(&self) -> impl Iterator<Item = u64> + '_ {
        self.oscillators.keys().copied()
    }

    /// Number of active oscillators.
    #[must_use]
    pub fn oscillator_count(&self) -> usize {
        self.oscillators.len()
    }

    /// Iterates `(prime, oscillator)` pairs in prime order.
    pub fn oscillators(&self) -> impl Iterator<Item = (u64, &Oscillator)> {
        self.oscillators.iter().map(|(&p, o)| (p, o))
    }

    /// Mutable iteration over all oscillators.
    pub fn oscillators_mut(&mut self) -> impl Iterator<Item = (u64, &mut Oscillator)> {
        self.oscillators.iter_mut().map(|(&p, o)| (p, o))
    }

    /// Records an entanglement pair.
    pub fn entangle(&mut self, a: u64, b: u64) {
        self.entanglements.push((a, b));
    }

    /// The recorded entanglement pairs, in creation order.
    #[must_use]
    pub fn entanglements(&self) -> &[(u64, u64)] {
        &self.entanglements
    }

    /// Writes a register, creating it on first use.
    pub fn set_register(&mut self, name: &str, value: f64, kind: RegisterKind) {
        self.registers
            .insert(name.to_string(), Register { value, kind });
    }

    /// Reads a register value; absent registers read as zero.
    #[must_use]
    pub fn register(&self, name: &str) -> f64 {
        self.registers.get(name).map_or(0.0, |r| r.value)
    }

    /// Full register record, if the register exists.
    #[must_use]
    pub fn register_entry(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    /// Pairwise coherence `cos(phase_p - phase_q) * amp_p * amp_q`.
    #[must_use]
    pub fn coherence(&self, p: u64, q: u64) -> f64 {
        (self.phase(p) - self.phase(q)).cos() * self.amplitude(p) * self.amplitude(q)
    }

    /// Mean pairwise coherence over all active primes. Zero below 2 primes.
    #[must_use]
    pub fn global_coherence(&self) -> f64 {
        let primes: Vec<u64> = self.active_primes().collect();
        let n = primes.len();
        if n < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                total += self.coherence(primes[i], primes[j]);
            }
        }
        total / (n * (n - 1) / 2) as f64
    }

    /// Current model entropy.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// One evolution step: damps every amplitude by `exp(-S*dt)` and decays
    /// the model entropy over the accumulated elapsed time.
    pub fn evolve(&mut self, dt: f64) {
        let damping = (-self.entropy * dt).exp();
        for osc in self.oscillators.values_mut() {
            osc.set_amplitude(osc.amplitude * damping);
        }
        self.entropy_elapsed += dt;
        self.entropy = ENTROPY_INITIAL * (-ENTROPY_LAMBDA * self.entropy_elapsed).exp();
    }

    /// Global time, advanced only by `TICK`.
    #[must_use]
    pub fn global_time(&self) -> f64 {
        self.global_time
    }

    /// Advances global time by one tick.
    pub fn tick(&mut self) {
        self.global_time += TICK_DT;
    }

    /// Clears everything back to the fresh state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

// =============================================================================
// TESTS
// =============================================================================
