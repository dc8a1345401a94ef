use crate::userdb::Role;

use super::state::AuthState;

/// Outcome of checking a resolved state against a page's required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    Granted,
    SignInRequired,
    /// Signed in, but the role has not been chosen yet.
    ProvisioningRequired,
    AccessDenied { required: Role, actual: Role },
}

impl RoleGate {
    pub fn check(state: AuthState, required: Role) -> Self {
        match state {
            AuthState::Unauthenticated => Self::SignInRequired,
            AuthState::Authenticating => Self::ProvisioningRequired,
            AuthState::Authenticated(actual) if actual == required => Self::Granted,
            AuthState::Authenticated(actual) => Self::AccessDenied { required, actual },
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}
