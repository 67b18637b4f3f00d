//! # Instruction Set
//!
//! Dispatch is a mnemonic-to-handler map. Each handler mutates the
//! engine and returns whether the IP should auto-advance; jump-style
//! handlers set the IP themselves and return `false`.

use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use std::collections::HashMap;
use std::sync::OnceLock;

mod amplitude;
mod coherence;
mod flow;
mod holo;
mod phase;
mod quantum;
mod resonance;
mod system;

/// One opcode implementation.
///
/// Returns `Ok(true)` to auto-advance the IP, `Ok(false)` when the
/// handler moved the IP (or parked/halted the engine) itself.
pub trait Handler: Send + Sync {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError>;
}

type Registry = HashMap<&'static str, Box<dyn Handler>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = Registry::new();
        amplitude::register(&mut map);
        phase::register(&mut map);
        quantum::register(&mut map);
        flow::register(&mut map);
        coherence::register(&mut map);
        resonance::register(&mut map);
        holo::register(&mut map);
        system::register(&mut map);
        map
    })
}

/// Looks up the handler for an uppercased mnemonic.
#[must_use]
pub fn lookup(mnemonic: &str) -> Option<&'static dyn Handler> {
    registry().get(mnemonic).map(Box::as_ref)
}

/// All registered mnemonics, for diagnostics.
pub fn mnemonics() -> impl Iterator<Item = &'static str> {
    registry().keys().copied()
}

// =============================================================================
// TESTS
// =============================================================================
