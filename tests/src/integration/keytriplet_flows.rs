//! Identity flows: deterministic generation, the public-key contract,
//! and normalisation through evolution.

use prn_keys::Keytriplet;

#[test]
fn classical_key_is_reproducible() {
    let first = Keytriplet::generate("S", "alice").unwrap();
    let second = Keytriplet::generate("S", "alice").unwrap();
    assert_eq!(first.classical_public_key(), second.classical_public_key());
}

#[test]
fn classical_key_separates_identities() {
    let alice = Keytriplet::generate("S", "alice").unwrap();
    let bob = Keytriplet::generate("S", "bob").unwrap();
    let alice_other = Keytriplet::generate("S2", "alice").unwrap();
    assert_ne!(alice.classical_public_key(), bob.classical_public_key());
    assert_ne!(
        alice.classical_public_key(),
        alice_other.classical_public_key()
    );
}

#[test]
fn private_key_normalisation_survives_evolution() {
    let mut key = Keytriplet::generate("S", "alice").unwrap();
    for _ in 0..20 {
        key.evolve(0.1).unwrap();
        assert!((key.private_key().norm() - 1.0).abs() < 1e-3);
        assert!((key.resonance_key().norm() - 1.0).abs() < 1e-3);
    }
}

#[test]
fn resonance_key_lives_on_the_private_basis() {
    let key = Keytriplet::generate("S", "carol").unwrap();
    assert_eq!(key.resonance_key().primes(), key.private_key().primes());
    // The projection zeroes a real fraction of the basis.
    let silent = key
        .resonance_key()
        .coeffs()
        .iter()
        .filter(|c| c.is_zero())
        .count();
    assert!(silent > 0);
}

#[test]
fn entropy_of_generated_keys_is_high() {
    // 256 amplitudes drawn from a mixed hash should be spread out.
    let key = Keytriplet::generate("S", "dave").unwrap();
    assert!(key.private_key().entropy() > 0.6);
}
