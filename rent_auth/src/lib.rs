//! rent-auth - sign-in and authorization core for the rent-splitting dashboard
//!
//! PKCE OAuth sign-in against a GoTrue-style identity provider, resolution of
//! a session into one of three application states, and role provisioning.
//! Framework integration lives in `rent-auth-axum`.

mod api;
mod config;
mod coordination;
mod pkce;
mod resolver;
mod session;
mod storage;
mod userdb;
mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::{API_URL, ApiClient, ApiError, SelectUserTypeRequest, SelectUserTypeResponse};

pub use config::{
    AUTH_CALLBACK_URL, AUTH_OWNER_HOME, AUTH_PROTECTED_PREFIXES, AUTH_ROUTE_PREFIX,
    AUTH_SELECT_ROLE_PATH, AUTH_SERVER_PKCE_REQUIRED, AUTH_SIGNIN_PATH, AUTH_TENANT_HOME, ORIGIN,
    is_protected_path, path_has_prefix,
};

pub use coordination::{
    AuthClient, CallbackError, CallbackParams, Destination, ErrorTag, ServerCallbackOptions,
    ServerCallbackResponse, ServerSignIn, begin_client_sign_in, begin_server_sign_in,
    handle_client_callback, handle_server_callback, sign_out_client, sign_out_request,
};

pub use pkce::{
    CHALLENGE_METHOD, CodeChallenge, CodeVerifier, CookieTransport, EphemeralTransport,
    PKCE_COOKIE_MAX_AGE, PKCE_COOKIE_NAME, PkceError, PkceStore, VerifierTransport,
    derive_challenge, generate_verifier,
};

pub use resolver::{
    AuthEvent, AuthState, Resolution, RoleGate, resolve, resolve_session, resolve_with_diagnostics,
};

pub use session::{
    AUTH_ACCESS_COOKIE_NAME, AUTH_REFRESH_COOKIE_NAME, HttpIdentityProvider, IDP_API_KEY, IDP_URL,
    IdentityProvider, OAuthProvider, RequestSession, SESSION_COOKIE_MAX_AGE, Session,
    SessionClient, SessionError, SessionEvent, SessionUser, Subscription,
    clear_session_cookie_headers, resolve_request_session, session_cookie_headers,
};

pub use storage::{
    CacheData, CacheStore, InMemoryCacheStore, SharedCacheStore, StorageError,
    shared_memory_store,
};

pub use userdb::{
    APP_USER_STORE_URL, AppUserStore, ApplicationUser, InMemoryAppUserStore, LookupError,
    PostgresAppUserStore, Role, SqliteAppUserStore, connect_app_user_store,
};

pub use utils::{UtilError, get_cookie_from_headers, merge_set_cookies, secure_cookies};
