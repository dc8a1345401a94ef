//! Proof Key for Code Exchange: the verifier secret, its challenge, and the
//! two places the verifier is kept while a sign-in is in flight.

mod config;
mod errors;
mod transport;
mod verifier;

pub use config::{PKCE_COOKIE_MAX_AGE, PKCE_COOKIE_NAME};
pub use errors::PkceError;
pub use transport::{CookieTransport, EphemeralTransport, PkceStore, VerifierTransport};
pub use verifier::{
    CHALLENGE_METHOD, CodeChallenge, CodeVerifier, derive_challenge, generate_verifier,
};
