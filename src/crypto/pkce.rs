//! PKCE (RFC 7636) verifier/challenge pairs and random `state` values.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::base64::base64url_encode;

/// A PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier from 32 random bytes (43 characters).
    pub fn generate() -> Self {
        let verifier = base64url_encode(&random_bytes::<32>());
        let challenge = s256_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// S256 challenge: URL-safe base64 of the SHA-256 of the verifier.
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64url_encode(&digest)
}

/// Generate an unguessable `state` value for the authorization request.
pub fn random_state() -> String {
    base64url_encode(&random_bytes::<16>())
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_vector() {
        // Appendix B of RFC 7636
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            s256_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generated_pair() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), 43);
        assert_eq!(pair.challenge, s256_challenge(&pair.verifier));
    }

    #[test]
    fn test_states_are_different() {
        assert_ne!(random_state(), random_state());
    }
}
