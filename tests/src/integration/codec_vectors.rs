//! Published-vector checks across the numerics surface: the codecs, the
//! modular arithmetic identities, and primality against a reference
//! sieve.

use prn_numerics::{
    hmac_sha256, is_prime, mod_exp, mod_exp_opt, mod_inverse, mod_mul, pbkdf2_hmac_sha256,
    sha256, sha256_hex, sieve,
};
use proptest::prelude::*;

#[test]
fn sha256_published_vectors() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(
        sha256_hex(b"The quick brown fox jumps over the lazy dog"),
        "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
    );
}

#[test]
fn hmac_is_pure_and_folds_long_keys() {
    let key = vec![0x42u8; 200];
    let message = b"resonance";
    assert_eq!(hmac_sha256(&key, message), hmac_sha256(&key, message));
    assert_eq!(
        hmac_sha256(&key, message),
        hmac_sha256(&sha256(&key), message)
    );
}

#[test]
fn pbkdf2_lengths_and_separation() {
    let a = pbkdf2_hmac_sha256(b"password", b"salt-a", 100, 64).unwrap();
    let b = pbkdf2_hmac_sha256(b"password", b"salt-b", 100, 64).unwrap();
    assert_eq!(a.len(), 64);
    assert_eq!(b.len(), 64);
    assert_ne!(a, b);
}

#[test]
fn mod_exp_scenarios() {
    assert_eq!(mod_exp(2, 10, 1000), 24);
    assert_eq!(mod_exp(7, 560, 561), 1); // Carmichael number 561
    assert_eq!(mod_exp_opt(7, 560, 561), 1);
}

#[test]
fn primality_matches_reference_sieve() {
    let reference: std::collections::BTreeSet<u64> = sieve(2000).into_iter().collect();
    for n in 0..=2000u64 {
        assert_eq!(is_prime(n), reference.contains(&n), "n = {n}");
    }
}

proptest! {
    // Euler: a^phi(m) = 1 (mod m) whenever gcd(a, m) = 1; for odd prime m,
    // phi(m) = m - 1.
    #[test]
    fn fermat_holds_for_primes(seed in 0u64..5_000) {
        let m = (2 * seed + 3) | 1;
        if is_prime(m) {
            let a = seed % (m - 1) + 1;
            prop_assert_eq!(mod_exp(a, m - 1, m), 1);
        }
    }

    #[test]
    fn inverse_roundtrips(a in 1u64..1_000_000, m in 2u64..1_000_000) {
        let inv = mod_inverse(a, m);
        if inv != 0 {
            prop_assert_eq!(mod_mul(a, inv, m), 1);
        }
    }
}
