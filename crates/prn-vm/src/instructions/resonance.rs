//! Resonance and evolution instructions: `EVOLVE`, `ENTROPY`,
//! `FACTORIZE`, `RESONANCE`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use crate::state::RegisterKind;
use std::f64::consts::TAU;

/// `EVOLVE dt`: entropy-damped amplitude decay plus entropy advance.
struct Evolve;

impl Handler for Evolve {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let dt = engine.value_arg("EVOLVE", args, 0)?;
        engine.state.evolve(dt);
        Ok(true)
    }
}

/// `ENTROPY reg`: write the current model entropy.
struct Entropy;

impl Handler for Entropy {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let reg = engine.str_arg("ENTROPY", args, 0)?.to_string();
        let value = engine.state.entropy();
        engine.state.set_register(&reg, value, RegisterKind::Entropy);
        Ok(true)
    }
}

/// `FACTORIZE n reg`: boost the amplitude of every distinct prime factor
/// of n by 0.1 and write the distinct-factor count.
struct Factorize;

impl Handler for Factorize {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let n = engine
            .arg("FACTORIZE", args, 0)?
            .as_u64()
            .ok_or(VmError::InvalidOperand {
                mnemonic: "FACTORIZE".to_string(),
                index: 0,
                expected: "a non-negative integer",
            })?;
        let reg = engine.str_arg("FACTORIZE", args, 1)?.to_string();

        let factors = distinct_prime_factors(n);
        for &p in &factors {
            let osc = engine.state.oscillator_mut(p);
            osc.set_amplitude(osc.amplitude() + 0.1);
        }
        engine
            .state
            .set_register(&reg, factors.len() as f64, RegisterKind::Count);
        Ok(true)
    }
}

/// `RESONANCE p v`: add `2*pi*ln(v)/ln(p)` to the phase of prime p.
struct Resonance;

impl Handler for Resonance {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("RESONANCE", args, 0)?;
        let value = engine.value_arg("RESONANCE", args, 1)?;
        if value <= 0.0 {
            return Err(VmError::InvalidOperand {
                mnemonic: "RESONANCE".to_string(),
                index: 1,
                expected: "a positive value",
            });
        }
        let delta = TAU * value.ln() / (prime as f64).ln();
        engine.state.oscillator_mut(prime).advance_phase(delta);
        Ok(true)
    }
}

/// Distinct prime factors of n by trial division, ascending.
fn distinct_prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            factors.push(d);
            while n % d == 0 {
                n /= d;
            }
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

pub(super) fn register(map: &mut Registry) {
    map.insert("EVOLVE", Box::new(Evolve));
    map.insert("ENTROPY", Box::new(Entropy));
    map.insert("FACTORIZE", Box::new(Factorize));
    map.insert("RESONANCE", Box::new(Resonance));
}

// =============================================================================
// TESTS
// =============================================================================
