use crate::config::{AUTH_OWNER_HOME, AUTH_SELECT_ROLE_PATH, AUTH_SIGNIN_PATH, AUTH_TENANT_HOME};
use crate::resolver::AuthState;
use crate::userdb::Role;

use super::errors::ErrorTag;

/// Where the browser goes after a sign-in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    SignIn { error: Option<ErrorTag> },
    SelectRole,
    Home(Role),
}

impl Destination {
    pub fn for_state(state: AuthState) -> Self {
        match state {
            AuthState::Unauthenticated => Self::SignIn { error: None },
            AuthState::Authenticating => Self::SelectRole,
            AuthState::Authenticated(role) => Self::Home(role),
        }
    }

    pub fn sign_in_error(tag: ErrorTag) -> Self {
        Self::SignIn { error: Some(tag) }
    }

    /// Same-origin path for a redirect.
    pub fn path(&self) -> String {
        match self {
            Self::SignIn { error: None } => AUTH_SIGNIN_PATH.clone(),
            Self::SignIn { error: Some(tag) } => format!("{}?error={tag}", *AUTH_SIGNIN_PATH),
            Self::SelectRole => AUTH_SELECT_ROLE_PATH.clone(),
            Self::Home(Role::Owner) => AUTH_OWNER_HOME.clone(),
            Self::Home(Role::Tenant) => AUTH_TENANT_HOME.clone(),
        }
    }
}
