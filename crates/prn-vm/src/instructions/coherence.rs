//! Coherence instructions: `COHERENCE`, `COHERENCEALL`, `THRESHOLD`,
//! `WAITCOH`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use crate::state::RegisterKind;

/// `COHERENCE p q reg`: write the pairwise coherence of two primes.
struct Coherence;

impl Handler for Coherence {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let p = engine.prime_arg("COHERENCE", args, 0)?;
        let q = engine.prime_arg("COHERENCE", args, 1)?;
        let reg = engine.str_arg("COHERENCE", args, 2)?.to_string();
        let value = engine.state.coherence(p, q);
        engine.state.set_register(&reg, value, RegisterKind::Coherence);
        Ok(true)
    }
}

/// `COHERENCEALL reg`: write the mean pairwise coherence.
struct CoherenceAll;

impl Handler for CoherenceAll {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let reg = engine.str_arg("COHERENCEALL", args, 0)?.to_string();
        let value = engine.state.global_coherence();
        engine.state.set_register(&reg, value, RegisterKind::Coherence);
        Ok(true)
    }
}

/// `THRESHOLD reg t`: gate the next instruction on a register value.
/// Below the threshold, the following instruction is skipped.
struct Threshold;

impl Handler for Threshold {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let reg = engine.str_arg("THRESHOLD", args, 0)?;
        let threshold = engine.value_arg("THRESHOLD", args, 1)?;
        if engine.state.register(reg) >= threshold {
            Ok(true)
        } else {
            engine.context.ip += 2;
            Ok(false)
        }
    }
}

/// `WAITCOH t`: park the engine while global coherence is below t.
/// The driver re-steps later; the IP does not move while parked.
struct WaitCoh;

impl Handler for WaitCoh {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let threshold = engine.value_arg("WAITCOH", args, 0)?;
        if engine.state.global_coherence() >= threshold {
            engine.context.flags.waiting = false;
            Ok(true)
        } else {
            engine.context.flags.waiting = true;
            Ok(false)
        }
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("COHERENCE", Box::new(Coherence));
    map.insert("COHERENCEALL", Box::new(CoherenceAll));
    map.insert("THRESHOLD", Box::new(Threshold));
    map.insert("WAITCOH", Box::new(WaitCoh));
}

// =============================================================================
// TESTS
// =============================================================================
