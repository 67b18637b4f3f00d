//! Two-party PR-UTC exchange through the system registry.

use prn_session::{PrutcSystem, SessionError};

fn system() -> PrutcSystem {
    let mut system = PrutcSystem::new("S");
    system.register_user("alice").unwrap();
    system.register_user("bob").unwrap();
    system
}

#[test]
fn send_receive_roundtrip_delivers_payload() {
    let mut system = system();
    let session = system.establish_session("alice", "bob").unwrap();

    system.send(session, "alice", "Hello").unwrap();
    let payloads = system.receive(session, "bob").unwrap();

    assert!(!payloads.is_empty());
    assert_eq!(payloads[0].from, "alice");
    assert!(!payloads[0].summary.is_empty());
    assert!((0.0..=1.0).contains(&payloads[0].entropy));
}

#[test]
fn traffic_is_ordered_and_directional() {
    let mut system = system();
    let session = system.establish_session("alice", "bob").unwrap();

    system.send(session, "alice", "one").unwrap();
    system.send(session, "bob", "two").unwrap();
    system.send(session, "alice", "three").unwrap();

    let to_bob = system.receive(session, "bob").unwrap();
    assert_eq!(to_bob.len(), 2);
    assert!(to_bob.iter().all(|m| m.from == "alice"));

    let to_alice = system.receive(session, "alice").unwrap();
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0].from, "bob");
}

#[test]
fn shared_field_stays_normalised_through_traffic() {
    let mut system = system();
    let session = system.establish_session("alice", "bob").unwrap();
    for i in 0..5 {
        system
            .send(session, "alice", &format!("message {i}"))
            .unwrap();
        system.receive(session, "bob").unwrap();
        let field = system.session(session).unwrap().field();
        assert!((field.norm() - 1.0).abs() < 1e-3);
    }
}

#[test]
fn key_evolution_yields_fresh_sessions() {
    let mut system = system();
    let before = system.establish_session("alice", "bob").unwrap();
    system.evolve_keys(0.25).unwrap();
    let after = system.establish_session("alice", "bob").unwrap();
    assert_ne!(before, after);

    // Both sessions stay usable and independent.
    system.send(before, "alice", "old channel").unwrap();
    system.send(after, "alice", "new channel").unwrap();
    assert_eq!(system.receive(before, "bob").unwrap().len(), 1);
    assert_eq!(system.receive(after, "bob").unwrap().len(), 1);
}

#[test]
fn closed_sessions_reject_everything() {
    let mut system = system();
    let session = system.establish_session("alice", "bob").unwrap();
    system.close_session(session).unwrap();
    assert!(matches!(
        system.send(session, "alice", "late"),
        Err(SessionError::SessionNotFound(_))
    ));
    assert!(matches!(
        system.close_session(session),
        Err(SessionError::SessionNotFound(_))
    ));
}

#[test]
fn session_errors_map_into_the_taxonomy() {
    let mut system = system();
    let err = system.establish_session("alice", "nobody").unwrap_err();
    let prn: prn_types::PrnError = err.into();
    assert_eq!(prn.category, prn_types::ErrorCategory::Validation);
    assert_eq!(prn.code, prn_types::codes::UNKNOWN_USER);
    assert!(!prn.context.is_empty() || !prn.message.is_empty());
}
