//! Symbolic amplitude instructions: `LOAD`, `ADD`, `SCALE`, `MIX`.
//! Every write clamps to [0, 1] inside the oscillator.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;

/// `LOAD p a`: set amplitude of prime p to a.
struct Load;

impl Handler for Load {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("LOAD", args, 0)?;
        let amplitude = engine.value_arg("LOAD", args, 1)?;
        engine.state.oscillator_mut(prime).set_amplitude(amplitude);
        Ok(true)
    }
}

/// `ADD p x`: add x to the amplitude of prime p.
struct Add;

impl Handler for Add {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("ADD", args, 0)?;
        let delta = engine.value_arg("ADD", args, 1)?;
        let osc = engine.state.oscillator_mut(prime);
        osc.set_amplitude(osc.amplitude() + delta);
        Ok(true)
    }
}

/// `SCALE p f`: multiply the amplitude of prime p by f.
struct Scale;

impl Handler for Scale {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("SCALE", args, 0)?;
        let factor = engine.value_arg("SCALE", args, 1)?;
        let osc = engine.state.oscillator_mut(prime);
        osc.set_amplitude(osc.amplitude() * factor);
        Ok(true)
    }
}

/// `MIX p q r`: amp_p <- (1-r)*amp_p + r*amp_q.
struct Mix;

impl Handler for Mix {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let p = engine.prime_arg("MIX", args, 0)?;
        let q = engine.prime_arg("MIX", args, 1)?;
        let ratio = engine.value_arg("MIX", args, 2)?;
        let amp_q = engine.state.amplitude(q);
        let osc = engine.state.oscillator_mut(p);
        osc.set_amplitude((1.0 - ratio) * osc.amplitude() + ratio * amp_q);
        Ok(true)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("LOAD", Box::new(Load));
    map.insert("ADD", Box::new(Add));
    map.insert("SCALE", Box::new(Scale));
    map.insert("MIX", Box::new(Mix));
}

// =============================================================================
// TESTS
// =============================================================================
