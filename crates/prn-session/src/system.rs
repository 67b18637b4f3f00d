//! # PR-UTC System Registry
//!
//! Owns the identity map and the live sessions. Sessions hold only the
//! endpoint ids, never the keys themselves; all key material stays here.

use crate::field::resonance_field;
use crate::session::{CommunicationSession, DecodedMessage, SessionError};
use prn_keys::Keytriplet;
use std::collections::HashMap;
use uuid::Uuid;

/// Registry of identities and sessions under one global seed.
#[derive(Debug)]
pub struct PrutcSystem {
    global_seed: String,
    users: HashMap<String, Keytriplet>,
    sessions: HashMap<Uuid, CommunicationSession>,
}

impl PrutcSystem {
    /// Creates an empty system bound to `global_seed`.
    #[must_use]
    pub fn new(global_seed: impl Into<String>) -> Self {
        Self {
            global_seed: global_seed.into(),
            users: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    /// Derives and stores the keytriplet for `user_id`.
    ///
    /// # Errors
    ///
    /// Rejects duplicate registrations.
    pub fn register_user(&mut self, user_id: &str) -> Result<&Keytriplet, SessionError> {
        if self.users.contains_key(user_id) {
            return Err(SessionError::UserAlreadyRegistered {
                user_id: user_id.to_string(),
            });
        }
        let key = Keytriplet::generate(&self.global_seed, user_id)?;
        tracing::info!(user_id, "user registered");
        Ok(self.users.entry(user_id.to_string()).or_insert(key))
    }

    /// The keytriplet of a registered user.
    #[must_use]
    pub fn key_of(&self, user_id: &str) -> Option<&Keytriplet> {
        self.users.get(user_id)
    }

    /// Registered user count.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Opens a session between two registered users and returns its id.
    ///
    /// # Errors
    ///
    /// Both endpoints must be registered.
    pub fn establish_session(&mut self, user_a: &str, user_b: &str) -> Result<Uuid, SessionError> {
        let key_a = self.users.get(user_a).ok_or_else(|| SessionError::UnknownUser {
            user_id: user_a.to_string(),
        })?;
        let key_b = self.users.get(user_b).ok_or_else(|| SessionError::UnknownUser {
            user_id: user_b.to_string(),
        })?;
        let field = resonance_field(key_a.resonance_key(), key_b.resonance_key())?;
        let session = CommunicationSession::establish(user_a, user_b, field);
        let id = session.id();
        self.sessions.insert(id, session);
        Ok(id)
    }

    /// Injects a message from `sender` into a session.
    ///
    /// # Errors
    ///
    /// The session must exist and accept the sender.
    pub fn send(&mut self, session_id: Uuid, sender: &str, text: &str) -> Result<(), SessionError> {
        self.sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?
            .inject_message(sender, text)
    }

    /// Drives pending evolution and drains `recipient`'s inbox.
    ///
    /// # Errors
    ///
    /// The session must exist and accept the recipient.
    pub fn receive(
        &mut self,
        session_id: Uuid,
        recipient: &str,
    ) -> Result<Vec<DecodedMessage>, SessionError> {
        self.sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?
            .extract_messages(recipient)
    }

    /// Evolves every registered key by `dt`.
    ///
    /// # Errors
    ///
    /// Only on internal key-evolution failure.
    pub fn evolve_keys(&mut self, dt: f64) -> Result<(), SessionError> {
        for key in self.users.values_mut() {
            key.evolve(dt)?;
        }
        tracing::debug!(dt, users = self.users.len(), "keys evolved");
        Ok(())
    }

    /// Closes and removes a session. Teardown is synchronous.
    ///
    /// # Errors
    ///
    /// The session must exist.
    pub fn close_session(&mut self, session_id: Uuid) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .remove(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        session.close();
        Ok(())
    }

    /// Read access to a live session.
    #[must_use]
    pub fn session(&self, session_id: Uuid) -> Option<&CommunicationSession> {
        self.sessions.get(&session_id)
    }
}

// =============================================================================
// TESTS
// =============================================================================
