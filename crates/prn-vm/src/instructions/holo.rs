//! Holographic store instructions: `HOLO_STORE`, `HOLO_RETRIEVE`,
//! `HOLO_FRAGMENT`, `HOLO_RECONSTRUCT`.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use crate::state::RegisterKind;

/// `HOLO_STORE pat key`: store a pattern value under a key.
struct HoloStore;

impl Handler for HoloStore {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let value = engine.value_arg("HOLO_STORE", args, 0)?;
        let key = engine.str_arg("HOLO_STORE", args, 1)?.to_string();
        engine.holo.store(&key, value);
        Ok(true)
    }
}

/// `HOLO_RETRIEVE key threshold reg`: threshold-gated lookup; misses
/// and sub-threshold values read as zero.
struct HoloRetrieve;

impl Handler for HoloRetrieve {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let key = engine.str_arg("HOLO_RETRIEVE", args, 0)?.to_string();
        let threshold = engine.value_arg("HOLO_RETRIEVE", args, 1)?;
        let reg = engine.str_arg("HOLO_RETRIEVE", args, 2)?.to_string();
        let value = engine.holo.retrieve(&key, threshold).unwrap_or(0.0);
        engine.state.set_register(&reg, value, RegisterKind::General);
        Ok(true)
    }
}

/// `HOLO_FRAGMENT pat n outBase`: split a pattern into n fragments.
struct HoloFragment;

impl Handler for HoloFragment {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let value = engine.value_arg("HOLO_FRAGMENT", args, 0)?;
        let count = engine
            .arg("HOLO_FRAGMENT", args, 1)?
            .as_u64()
            .ok_or(VmError::InvalidOperand {
                mnemonic: "HOLO_FRAGMENT".to_string(),
                index: 1,
                expected: "a non-negative fragment count",
            })?;
        let out_base = engine.str_arg("HOLO_FRAGMENT", args, 2)?.to_string();
        engine.holo.fragment(value, count, &out_base);
        Ok(true)
    }
}

/// `HOLO_RECONSTRUCT base reg`: sum the fragments of a base into a
/// register; an unknown base reads as zero.
struct HoloReconstruct;

impl Handler for HoloReconstruct {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let base = engine.str_arg("HOLO_RECONSTRUCT", args, 0)?.to_string();
        let reg = engine.str_arg("HOLO_RECONSTRUCT", args, 1)?.to_string();
        let value = engine.holo.reconstruct(&base).unwrap_or(0.0);
        engine.state.set_register(&reg, value, RegisterKind::General);
        Ok(true)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("HOLO_STORE", Box::new(HoloStore));
    map.insert("HOLO_RETRIEVE", Box::new(HoloRetrieve));
    map.insert("HOLO_FRAGMENT", Box::new(HoloFragment));
    map.insert("HOLO_RECONSTRUCT", Box::new(HoloReconstruct));
}

// =============================================================================
// TESTS
// =============================================================================
