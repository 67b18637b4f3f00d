//! # Communication Session
//!
//! A session owns a shared field and the message queues of its two
//! endpoints. Field evolution is stepwise and fully deterministic given
//! the session RNG seed: Hamiltonian drift, resonance damping, optional
//! message perturbation, renormalisation.
//!
//! Extraction is entropy-gated: after a message is evolved into the
//! field, the session looks for the collapse window `S in [0.2, 0.3]`,
//! relaxing the field with drift-only steps for a bounded time. A message
//! whose window never arrives is collapsed at the relaxation deadline so
//! injected traffic is never silently dropped; the decoded payload is a
//! formatted field summary either way.

use crate::perturbation::{MessagePerturbation, PrimeMapping};
use prn_keys::KeyError;
use prn_numerics::Lcg64;
use prn_state::{Complex64, PrimeState, StateError};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;
use thiserror::Error;
use uuid::Uuid;

/// Damping rate of the resonance-collapse step.
const DAMPING_LAMBDA: f64 = 0.1;

/// Stable resonance level the damping pulls toward.
const RESONANCE_STABLE: f64 = 0.25;

/// Collapse window: entropy range that triggers extraction.
const COLLAPSE_WINDOW: (f64, f64) = (0.2, 0.3);

/// Evolution step per queued message.
const MESSAGE_DT: f64 = 0.01;

/// Magnitude floor for a prime to appear in a decoded payload.
const DECODE_MAGNITUDE: f64 = 0.1;

/// Post-collapse attenuation applied to every coefficient.
const COLLAPSE_ATTENUATION: f64 = 0.5;

/// Upper bound of the post-collapse random perturbation magnitude.
const COLLAPSE_NOISE: f64 = 0.01;

/// Drift-only relaxation steps allowed while waiting for the window.
const MAX_RELAX_STEPS: u32 = 100;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but no field attached yet.
    Uninitialised,
    /// Field live; messages flow.
    Active,
    /// Closed; queues dropped, field discarded.
    Terminated,
}

/// Session-layer failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The user id is not registered with the system.
    #[error("unknown user: {user_id}")]
    UnknownUser { user_id: String },

    /// The user id is already registered.
    #[error("user already registered: {user_id}")]
    UserAlreadyRegistered { user_id: String },

    /// No session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// The user is not an endpoint of this session.
    #[error("user {user_id} is not an endpoint of session {session_id}")]
    NotAnEndpoint { session_id: Uuid, user_id: String },

    /// The session is terminated.
    #[error("session {0} is terminated")]
    Terminated(Uuid),

    /// State algebra failure.
    #[error(transparent)]
    State(#[from] StateError),

    /// Key layer failure.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl From<SessionError> for prn_types::PrnError {
    fn from(err: SessionError) -> Self {
        use prn_types::{codes, PrnError};
        let message = err.to_string();
        match err {
            SessionError::UnknownUser { user_id } => {
                PrnError::validation(codes::UNKNOWN_USER, message).with_context("user", user_id)
            }
            SessionError::UserAlreadyRegistered { user_id } => {
                PrnError::validation(codes::VALIDATION_FAILED, message)
                    .with_context("user", user_id)
            }
            SessionError::SessionNotFound(id) => {
                PrnError::state(codes::SESSION_NOT_FOUND, message)
                    .with_context("session", id.to_string())
            }
            SessionError::NotAnEndpoint { session_id, .. } => {
                PrnError::validation(codes::VALIDATION_FAILED, message)
                    .with_context("session", session_id.to_string())
            }
            SessionError::Terminated(id) => PrnError::state(codes::INVALID_STATE, message)
                .with_context("session", id.to_string()),
            SessionError::State(_) | SessionError::Key(_) => {
                PrnError::crypto(codes::KEY_DERIVATION_FAILED, message)
            }
        }
    }
}

/// A payload extracted from a collapsed field.
///
/// The payload is a formatted summary of the collapse, not an inverse of
/// the perturbation encoding; the contract is one decoded payload per
/// collapse, delivered to the sender's counterparty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// Endpoint that injected the originating message.
    pub from: String,
    /// Primes above the decode floor, by magnitude descending.
    pub dominant_primes: Vec<u64>,
    /// Field entropy at collapse.
    pub entropy: f64,
    /// Human-readable collapse summary.
    pub summary: String,
}

#[derive(Debug, Clone)]
struct PendingMessage {
    sender: String,
    perturbation: MessagePerturbation,
}

/// One live conversation between two registered identities.
#[derive(Debug)]
pub struct CommunicationSession {
    id: Uuid,
    user_a: String,
    user_b: String,
    field: PrimeState,
    mapping: PrimeMapping,
    pending: VecDeque<PendingMessage>,
    inboxes: HashMap<String, VecDeque<DecodedMessage>>,
    rng: Lcg64,
    state: SessionState,
}

impl CommunicationSession {
    /// Opens an active session over an initialised shared field.
    #[must_use]
    pub fn establish(user_a: &str, user_b: &str, field: PrimeState) -> Self {
        let id = Uuid::new_v4();
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&id.as_bytes()[..8]);
        let mut inboxes = HashMap::new();
        inboxes.insert(user_a.to_string(), VecDeque::new());
        inboxes.insert(user_b.to_string(), VecDeque::new());

        tracing::info!(session = %id, user_a, user_b, "session established");
        Self {
            id,
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
            field,
            mapping: PrimeMapping::new(),
            pending: VecDeque::new(),
            inboxes,
            rng: Lcg64::new(u64::from_be_bytes(seed_bytes)),
            state: SessionState::Active,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The shared field. Normalised at every observable point.
    #[must_use]
    pub fn field(&self) -> &PrimeState {
        &self.field
    }

    /// Queued-but-not-yet-evolved message count.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn ensure_endpoint(&self, user_id: &str) -> Result<(), SessionError> {
        if user_id == self.user_a || user_id == self.user_b {
            Ok(())
        } else {
            Err(SessionError::NotAnEndpoint {
                session_id: self.id,
                user_id: user_id.to_string(),
            })
        }
    }

    fn counterparty(&self, user_id: &str) -> &str {
        if user_id == self.user_a {
            &self.user_b
        } else {
            &self.user_a
        }
    }

    /// Encodes `text` and queues its perturbation for evolution.
    ///
    /// # Errors
    ///
    /// Rejects terminated sessions and non-endpoint senders.
    pub fn inject_message(&mut self, sender: &str, text: &str) -> Result<(), SessionError> {
        if self.state == SessionState::Terminated {
            return Err(SessionError::Terminated(self.id));
        }
        self.ensure_endpoint(sender)?;
        let perturbation = MessagePerturbation::encode(&self.mapping, text);
        tracing::debug!(
            session = %self.id,
            sender,
            targets = perturbation.len(),
            "message injected"
        );
        self.pending.push_back(PendingMessage {
            sender: sender.to_string(),
            perturbation,
        });
        Ok(())
    }

    /// Evolves every queued message into the field (in injection order)
    /// and drains `recipient`'s inbox.
    ///
    /// # Errors
    ///
    /// Rejects terminated sessions and non-endpoint recipients.
    pub fn extract_messages(
        &mut self,
        recipient: &str,
    ) -> Result<Vec<DecodedMessage>, SessionError> {
        if self.state == SessionState::Terminated {
            return Err(SessionError::Terminated(self.id));
        }
        self.ensure_endpoint(recipient)?;

        while let Some(message) = self.pending.pop_front() {
            evolve_field(&mut self.field, MESSAGE_DT, Some(&message.perturbation));
            let decoded = self.collapse(&message.sender);
            let target = self.counterparty(&message.sender).to_string();
            if let Some(inbox) = self.inboxes.get_mut(&target) {
                inbox.push_back(decoded);
            }
        }

        let inbox = self
            .inboxes
            .get_mut(recipient)
            .map(std::mem::take)
            .unwrap_or_default();
        Ok(inbox.into())
    }

    /// Waits for the collapse window, decodes, then applies the
    /// post-collapse attenuation and noise.
    fn collapse(&mut self, sender: &str) -> DecodedMessage {
        let mut entropy = self.field.entropy();
        let mut in_window = in_collapse_window(entropy);
        let mut relax_steps = 0u32;
        while !in_window && relax_steps < MAX_RELAX_STEPS {
            evolve_field(&mut self.field, MESSAGE_DT, None);
            entropy = self.field.entropy();
            in_window = in_collapse_window(entropy);
            relax_steps += 1;
        }
        if !in_window {
            tracing::debug!(
                session = %self.id,
                entropy,
                "collapse window missed; forcing extraction at deadline"
            );
        }

        let mut dominant: Vec<(u64, f64)> = self
            .field
            .primes()
            .iter()
            .zip(self.field.coeffs())
            .filter(|(_, c)| c.magnitude() > DECODE_MAGNITUDE)
            .map(|(&p, c)| (p, c.magnitude()))
            .collect();
        dominant.sort_by(|a, b| b.1.total_cmp(&a.1));
        let dominant_primes: Vec<u64> = dominant.iter().map(|&(p, _)| p).collect();

        let summary = format!(
            "collapse: {} dominant primes, entropy {:.4}",
            dominant_primes.len(),
            entropy
        );
        tracing::info!(session = %self.id, entropy, primes = dominant_primes.len(), "field collapsed");

        // Attenuate and re-seed the field with a little noise so repeated
        // collapses keep producing distinct spectra.
        for c in self.field.coeffs_mut() {
            let noise = Complex64::from_polar(
                COLLAPSE_NOISE * self.rng.next_f64(),
                self.rng.next_range(0.0, TAU),
            );
            *c = c.scale(COLLAPSE_ATTENUATION) + noise;
        }
        self.field.normalize();

        DecodedMessage {
            from: sender.to_string(),
            dominant_primes,
            entropy,
            summary,
        }
    }

    /// Terminates the session: queues drop, field is discarded.
    pub fn close(&mut self) {
        self.state = SessionState::Terminated;
        self.pending.clear();
        self.inboxes.clear();
        for c in self.field.coeffs_mut() {
            *c = Complex64::ZERO;
        }
        tracing::info!(session = %self.id, "session terminated");
    }
}

/// True when `entropy` lies inside the collapse window.
#[must_use]
pub fn in_collapse_window(entropy: f64) -> bool {
    (COLLAPSE_WINDOW.0..=COLLAPSE_WINDOW.1).contains(&entropy)
}

/// One evolution step: drift, resonance damping, optional perturbation,
/// renormalisation.
pub fn evolve_field(field: &mut PrimeState, dt: f64, perturbation: Option<&MessagePerturbation>) {
    // Hamiltonian drift: phase advances with ln(p).
    for i in 0..field.len() {
        let p = field.primes()[i];
        let c = field.coeffs()[i];
        field.coeffs_mut()[i] = c * Complex64::exp_i((p as f64).ln() * dt);
    }

    // Resonance damping toward the stable level.
    let r = resonance(field);
    let damp = (-DAMPING_LAMBDA * (r - RESONANCE_STABLE) * dt).exp();
    for c in field.coeffs_mut() {
        *c = c.scale(damp);
    }

    if let Some(message) = perturbation {
        for p in message.targets() {
            if let Some(modulation) = message.modulation(p) {
                let current = field.coefficient_of(p);
                if !current.is_zero() {
                    field.set_coefficient(p, current * modulation);
                }
            }
        }
    }

    field.normalize();
}

/// Mean conjugate-product magnitude over distinct prime pairs:
/// `sum_{i<j} |c_i* c_j| / C(n, 2)`.
#[must_use]
pub fn resonance(field: &PrimeState) -> f64 {
    let n = field.len();
    if n < 2 {
        return 0.0;
    }
    // |c_i* c_j| = |c_i||c_j|; the pair sum folds to (S1^2 - S2) / 2.
    let s1: f64 = field.coeffs().iter().map(|c| c.magnitude()).sum();
    let s2: f64 = field.coeffs().iter().map(|c| c.magnitude_squared()).sum();
    let pairs = (n * (n - 1) / 2) as f64;
    ((s1 * s1 - s2) / 2.0) / pairs
}

// =============================================================================
// TESTS
// =============================================================================
