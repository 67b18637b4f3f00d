//! Phase instructions: `SETPHASE`, `ADVPHASE`, `DECOHERE`, `ENTANGLE`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use std::f64::consts::TAU;

/// `SETPHASE p phi`: set the phase of prime p.
struct SetPhase;

impl Handler for SetPhase {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("SETPHASE", args, 0)?;
        let phi = engine.value_arg("SETPHASE", args, 1)?;
        engine.state.oscillator_mut(prime).set_phase(phi);
        Ok(true)
    }
}

/// `ADVPHASE p dt`: advance the phase of prime p by dt/p.
struct AdvPhase;

impl Handler for AdvPhase {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("ADVPHASE", args, 0)?;
        let dt = engine.value_arg("ADVPHASE", args, 1)?;
        engine
            .state
            .oscillator_mut(prime)
            .advance_phase(dt / prime as f64);
        Ok(true)
    }
}

/// `DECOHERE p`: randomise the phase of prime p.
struct Decohere;

impl Handler for Decohere {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("DECOHERE", args, 0)?;
        let phi = engine.rng.next_range(0.0, TAU);
        engine.state.oscillator_mut(prime).set_phase(phi);
        Ok(true)
    }
}

/// `ENTANGLE p q`: record an entanglement pair.
struct Entangle;

impl Handler for Entangle {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let p = engine.prime_arg("ENTANGLE", args, 0)?;
        let q = engine.prime_arg("ENTANGLE", args, 1)?;
        // Both oscillators become active even if silent.
        engine.state.oscillator_mut(p);
        engine.state.oscillator_mut(q);
        engine.state.entangle(p, q);
        Ok(true)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("SETPHASE", Box::new(SetPhase));
    map.insert("ADVPHASE", Box::new(AdvPhase));
    map.insert("DECOHERE", Box::new(Decohere));
    map.insert("ENTANGLE", Box::new(Entangle));
}

// =============================================================================
// TESTS
// =============================================================================
