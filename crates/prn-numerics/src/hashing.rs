//! # Hash Codecs
//!
//! One-shot SHA-256, HMAC-SHA256 (RFC 2104) and PBKDF2 (RFC 2898, with
//! HMAC-SHA256 as the PRF). Thin wrappers over the RustCrypto
//! implementations; the unit tests pin the published vectors so the
//! byte-exact contract stays visible at this boundary.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// 32-byte digest output.
pub type Digest32 = [u8; 32];

type HmacSha256 = Hmac<Sha256>;

/// Malformed codec requests. Everything else in this module is total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// PBKDF2 with zero iterations.
    #[error("PBKDF2 iteration count must be >= 1")]
    ZeroIterations,

    /// A derived key of zero length was requested.
    #[error("derived key length must be >= 1 byte")]
    EmptyDigestRequest,
}

/// SHA-256 of `data` (FIPS 180-4).
#[must_use]
pub fn sha256(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// HMAC-SHA256 of `message` under `key` (RFC 2104).
///
/// Keys longer than the 64-byte block are hashed first; shorter keys are
/// zero-padded. Both happen inside the Mac implementation.
#[must_use]
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Digest32 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// PBKDF2 with HMAC-SHA256 as the PRF (RFC 2898).
///
/// # Errors
///
/// Rejects zero iterations and zero-length output.
pub fn pbkdf2_hmac_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    dk_len: usize,
) -> Result<Vec<u8>, CodecError> {
    if iterations == 0 {
        return Err(CodecError::ZeroIterations);
    }
    if dk_len == 0 {
        return Err(CodecError::EmptyDigestRequest);
    }
    let mut out = vec![0u8; dk_len];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_fips_vectors() {
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
    fn test_sha256_length() {
        assert_eq!(sha256(b"any input").len(), 32);
    }

    #[test]
    fn test_hmac_rfc4231_case_1() {
        let key = [0x0bu8; 20];
        let mac = hmac_sha256(&key, b"Hi There");
        assert_eq!(
            hex::encode(mac),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_long_key_is_hashed_first() {
        // RFC 2104: keys past the 64-byte block are replaced by their hash.
        let long_key = [0xaau8; 131];
        let direct = hmac_sha256(&long_key, b"message");
        let via_hash = hmac_sha256(&sha256(&long_key), b"message");
        assert_eq!(direct, via_hash);
    }

    #[test]
    fn test_pbkdf2_rfc_vectors() {
        let dk = pbkdf2_hmac_sha256(b"password", b"salt", 1, 32).unwrap();
        assert_eq!(
            hex::encode(dk),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        let dk = pbkdf2_hmac_sha256(b"password", b"salt", 2, 32).unwrap();
        assert_eq!(
            hex::encode(dk),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );

        let dk = pbkdf2_hmac_sha256(b"password", b"salt", 4096, 32).unwrap();
        assert_eq!(
            hex::encode(dk),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn test_pbkdf2_requested_length() {
        let dk = pbkdf2_hmac_sha256(b"p", b"s", 10, 48).unwrap();
        assert_eq!(dk.len(), 48);
    }

    #[test]
    fn test_pbkdf2_distinct_inputs_distinct_outputs() {
        let a = pbkdf2_hmac_sha256(b"password", b"salt-a", 16, 32).unwrap();
        let b = pbkdf2_hmac_sha256(b"password", b"salt-b", 16, 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pbkdf2_malformed_requests() {
        assert_eq!(
            pbkdf2_hmac_sha256(b"p", b"s", 0, 32),
            Err(CodecError::ZeroIterations)
        );
        assert_eq!(
            pbkdf2_hmac_sha256(b"p", b"s", 1, 0),
            Err(CodecError::EmptyDigestRequest)
        );
    }
}
