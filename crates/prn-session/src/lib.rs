//! # PR-UTC Session Layer
//!
//! Two identities with resonance keys share a session **field**: a
//! normalised complex vector over the union of their prime bases,
//! initialised by a Gaussian resonance kernel. Messages inject phase
//! perturbations into that field; stepwise evolution (Hamiltonian drift,
//! resonance damping, perturbation) carries them, and an entropy-gated
//! collapse extracts a decoded payload on the recipient side.
//!
//! The [`PrutcSystem`] registry owns the identities; each
//! [`CommunicationSession`] owns only its field, queues and RNG, never
//! the endpoint keys.

pub mod field;
pub mod perturbation;
pub mod session;
pub mod system;

pub use field::resonance_field;
pub use perturbation::{MessagePerturbation, PrimeMapping};
pub use session::{
    evolve_field, resonance, CommunicationSession, DecodedMessage, SessionError, SessionState,
};
pub use system::PrutcSystem;
