//! Identity provider session: the provider client, the client-side session
//! holder and per-request session resolution for the server side.

mod client;
mod config;
mod cookie;
mod errors;
mod provider;
mod request;
mod subscription;
mod types;

pub use client::SessionClient;
pub use config::{
    AUTH_ACCESS_COOKIE_NAME, AUTH_REFRESH_COOKIE_NAME, IDP_API_KEY, IDP_URL,
    SESSION_COOKIE_MAX_AGE,
};
pub use cookie::{clear_session_cookie_headers, session_cookie_headers};
pub use errors::SessionError;
pub use provider::{HttpIdentityProvider, IdentityProvider};
pub use request::{RequestSession, resolve_request_session};
pub use subscription::Subscription;
pub use types::{OAuthProvider, Session, SessionEvent, SessionUser};

