//! System instructions: `TICK`, `RANDOM`, `OUTPUT`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use std::f64::consts::TAU;

/// `TICK`: advance global time by one step.
struct Tick;

impl Handler for Tick {
    fn execute(&self, engine: &mut Engine, _args: &[Argument]) -> Result<bool, VmError> {
        engine.state.tick();
        Ok(true)
    }
}

/// `RANDOM p`: randomise both amplitude and phase of prime p.
struct Random;

impl Handler for Random {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("RANDOM", args, 0)?;
        let amplitude = engine.rng.next_f64();
        let phase = engine.rng.next_range(0.0, TAU);
        let osc = engine.state.oscillator_mut(prime);
        osc.set_amplitude(amplitude);
        osc.set_phase(phase);
        Ok(true)
    }
}

/// `OUTPUT v`: emit a value through the output sink. A string operand
/// naming a live register emits the register value; other strings emit
/// verbatim.
struct Output;

impl Handler for Output {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let arg = engine.arg("OUTPUT", args, 0)?;
        let line = match arg {
            Argument::Int(v) => v.to_string(),
            Argument::Float(v) => v.to_string(),
            Argument::Str(name) => match engine.state.register_entry(name) {
                Some(register) => register.value.to_string(),
                None => name.clone(),
            },
        };
        engine.emit(line);
        Ok(true)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("TICK", Box::new(Tick));
    map.insert("RANDOM", Box::new(Random));
    map.insert("OUTPUT", Box::new(Output));
}

// =============================================================================
// TESTS
// =============================================================================
