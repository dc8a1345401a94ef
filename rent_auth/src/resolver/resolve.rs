use crate::session::{Session, SessionClient};
use crate::userdb::{AppUserStore, LookupError};

use super::state::AuthState;

/// An [`AuthState`] together with the lookup failure, if any, that forced it.
///
/// A failed lookup and a missing record both resolve to
/// [`AuthState::Authenticating`]; `lookup_error` tells them apart.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub state: AuthState,
    pub lookup_error: Option<LookupError>,
}

/// Resolves the state of the client's current session.
pub async fn resolve(client: &SessionClient, users: &dyn AppUserStore) -> AuthState {
    let session = client.get_session().await;
    resolve_session(session.as_ref(), users).await
}

/// Resolves the state for a session the caller already holds.
pub async fn resolve_session(session: Option<&Session>, users: &dyn AppUserStore) -> AuthState {
    resolve_with_diagnostics(session, users).await.state
}

pub async fn resolve_with_diagnostics(
    session: Option<&Session>,
    users: &dyn AppUserStore,
) -> Resolution {
    let Some(session) = session else {
        return Resolution {
            state: AuthState::Unauthenticated,
            lookup_error: None,
        };
    };

    match users.find_by_subject(session.subject_id()).await {
        Ok(Some(user)) => Resolution {
            state: AuthState::Authenticated(user.role),
            lookup_error: None,
        },
        Ok(None) => {
            tracing::debug!(subject = %session.subject_id(), "No application user yet");
            Resolution {
                state: AuthState::Authenticating,
                lookup_error: None,
            }
        }
        Err(e) => {
            tracing::warn!(
                subject = %session.subject_id(),
                error = %e,
                "Application user lookup failed; treating as unprovisioned"
            );
            Resolution {
                state: AuthState::Authenticating,
                lookup_error: Some(e),
            }
        }
    }
}
