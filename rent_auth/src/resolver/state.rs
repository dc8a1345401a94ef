use std::fmt;

use crate::session::SessionEvent;
use crate::userdb::Role;

/// Where a browsing context stands in the sign-in protocol.
///
/// Never stored. Always recomputed from the session and the application
/// user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No valid session.
    Unauthenticated,
    /// Valid session, but no application user record yet (role not chosen).
    Authenticating,
    /// Valid session and a provisioned application user.
    Authenticated(Role),
}

/// Inputs that move an [`AuthState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignInCompleted,
    RoleProvisioned(Role),
    SessionExpired,
    SignedOut,
}

impl AuthEvent {
    /// The auth event implied by a session change, if any. A token refresh
    /// keeps the current state.
    pub fn from_session_event(event: &SessionEvent) -> Option<Self> {
        match event {
            SessionEvent::SignedIn(_) => Some(Self::SignInCompleted),
            SessionEvent::TokenRefreshed(_) => None,
            SessionEvent::SignedOut => Some(Self::SignedOut),
        }
    }
}

impl AuthState {
    /// Applies `event`. Pairs without a defined transition leave the state as
    /// it is.
    pub fn transition(self, event: AuthEvent) -> Self {
        match (self, event) {
            (_, AuthEvent::SignedOut | AuthEvent::SessionExpired) => Self::Unauthenticated,
            (Self::Unauthenticated, AuthEvent::SignInCompleted) => Self::Authenticating,
            (Self::Authenticating, AuthEvent::RoleProvisioned(role)) => Self::Authenticated(role),
            (state, _) => state,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Authenticated(role) => Some(*role),
            Self::Unauthenticated | Self::Authenticating => None,
        }
    }

    pub fn has_session(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::Authenticated(role) => write!(f, "authenticated({role})"),
        }
    }
}
