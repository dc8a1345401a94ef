/// Cookie carrying the verifier to the server-driven callback.
pub const PKCE_COOKIE_NAME: &str = "pkce_code_verifier";

/// Verifier cookie lifetime in seconds.
pub const PKCE_COOKIE_MAX_AGE: i64 = 600;

/// Ephemeral store location of the verifier.
pub(super) const PKCE_STORE_PREFIX: &str = "pkce";
pub(super) const PKCE_STORE_KEY: &str = "code_verifier";
