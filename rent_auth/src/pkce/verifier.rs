use std::fmt;

use sha2::{Digest, Sha256};

use super::errors::PkceError;
use crate::utils::{base64url_encode, gen_random_bytes};

/// The only challenge method this crate sends.
pub const CHALLENGE_METHOD: &str = "S256";

const VERIFIER_BYTES: usize = 32;

// RFC 7636 section 4.1
const VERIFIER_MIN_LEN: usize = 43;
const VERIFIER_MAX_LEN: usize = 128;

/// High-entropy secret binding an authorization code to the client that
/// started the sign-in.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeVerifier(String);

impl CodeVerifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CodeVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CodeVerifier(<redacted>)")
    }
}

impl TryFrom<String> for CodeVerifier {
    type Error = PkceError;

    /// Accepts a previously stored verifier, rejecting anything RFC 7636
    /// would not allow (tampered or truncated cookies).
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let well_formed = (VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&value.len())
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'));
        if well_formed {
            Ok(Self(value))
        } else {
            Err(PkceError::InvalidVerifier)
        }
    }
}

/// SHA-256 of a verifier, sent openly with the sign-in redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge(String);

impl CodeChallenge {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates a fresh verifier from the OS random source.
///
/// # Panics
///
/// Panics when the operating system cannot provide randomness. There is no
/// safe way to continue a sign-in without entropy.
pub fn generate_verifier() -> CodeVerifier {
    match gen_random_bytes::<VERIFIER_BYTES>() {
        Ok(bytes) => CodeVerifier(base64url_encode(&bytes)),
        Err(e) => panic!("Cannot generate PKCE verifier: {e}"),
    }
}

/// `BASE64URL(SHA256(verifier))`, no padding.
pub fn derive_challenge(verifier: &CodeVerifier) -> CodeChallenge {
    let hash = Sha256::digest(verifier.as_str().as_bytes());
    CodeChallenge(base64url_encode(&hash))
}
