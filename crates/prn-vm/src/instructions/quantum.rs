//! Measurement-style instructions: `COLLAPSE`, `MEASURE`, `OBSERVE`,
//! `RECONSTRUCT`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use crate::state::RegisterKind;

/// `COLLAPSE`: pick one prime with probability proportional to
/// amplitude^2, zero the rest, set the chosen amplitude to 1.
struct Collapse;

impl Handler for Collapse {
    fn execute(&self, engine: &mut Engine, _args: &[Argument]) -> Result<bool, VmError> {
        let weights: Vec<(u64, f64)> = engine
            .state
            .oscillators()
            .map(|(p, o)| (p, o.amplitude() * o.amplitude()))
            .collect();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            // Nothing to collapse onto.
            return Ok(true);
        }

        let mut draw = engine.rng.next_f64() * total;
        let mut chosen = weights[weights.len() - 1].0;
        for (p, w) in &weights {
            if draw < *w {
                chosen = *p;
                break;
            }
            draw -= w;
        }

        for (p, osc) in engine.state.oscillators_mut() {
            osc.set_amplitude(if p == chosen { 1.0 } else { 0.0 });
        }
        tracing::debug!(prime = chosen, "state collapsed");
        Ok(true)
    }
}

/// `MEASURE p reg`: collapse to p with probability amplitude(p)^2,
/// writing 1 on success, 0 on failure (which zeroes p).
struct Measure;

impl Handler for Measure {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("MEASURE", args, 0)?;
        let reg = engine.str_arg("MEASURE", args, 1)?.to_string();
        let amplitude = engine.state.amplitude(prime);
        let probability = amplitude * amplitude;

        if engine.rng.next_f64() < probability {
            for (p, osc) in engine.state.oscillators_mut() {
                osc.set_amplitude(if p == prime { 1.0 } else { 0.0 });
            }
            engine.state.set_register(&reg, 1.0, RegisterKind::Success);
        } else {
            engine.state.oscillator_mut(prime).set_amplitude(0.0);
            engine.state.set_register(&reg, 0.0, RegisterKind::Success);
        }
        Ok(true)
    }
}

/// `OBSERVE p [base]`: write `<base>_amp` and `<base>_phase` registers
/// without disturbing the oscillator. Default base is `P<p>`.
struct Observe;

impl Handler for Observe {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let prime = engine.prime_arg("OBSERVE", args, 0)?;
        let base = match args.get(1) {
            Some(arg) => arg
                .as_str()
                .ok_or(VmError::InvalidOperand {
                    mnemonic: "OBSERVE".to_string(),
                    index: 1,
                    expected: "a register base name",
                })?
                .to_string(),
            None => format!("P{prime}"),
        };
        let amplitude = engine.state.amplitude(prime);
        let phase = engine.state.phase(prime);
        engine
            .state
            .set_register(&format!("{base}_amp"), amplitude, RegisterKind::Amplitude);
        engine
            .state
            .set_register(&format!("{base}_phase"), phase, RegisterKind::Phase);
        Ok(true)
    }
}

/// `RECONSTRUCT name reg`: retrieve a stored pattern (fragmented or
/// direct) into a register; absent patterns read as zero.
struct Reconstruct;

impl Handler for Reconstruct {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let name = engine.str_arg("RECONSTRUCT", args, 0)?.to_string();
        let reg = engine.str_arg("RECONSTRUCT", args, 1)?.to_string();
        let value = engine
            .holo
            .reconstruct(&name)
            .or_else(|| engine.holo.get(&name))
            .unwrap_or(0.0);
        engine.state.set_register(&reg, value, RegisterKind::General);
        Ok(true)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("COLLAPSE", Box::new(Collapse));
    map.insert("MEASURE", Box::new(Measure));
    map.insert("OBSERVE", Box::new(Observe));
    map.insert("RECONSTRUCT", Box::new(Reconstruct));
}

// =============================================================================
// TESTS
// =============================================================================
