use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use url::Url;

use super::errors::SessionError;
use super::provider::IdentityProvider;
use super::subscription::Subscription;
use super::types::{OAuthProvider, Session, SessionEvent};
use crate::pkce::{CodeChallenge, CodeVerifier};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Client-side view of the identity provider session.
///
/// Holds the current session for one browsing context and publishes a
/// [`SessionEvent`] whenever it changes.
pub struct SessionClient {
    provider: Arc<dyn IdentityProvider>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            current: RwLock::new(None),
            events,
        }
    }

    /// Starts from a session restored elsewhere (e.g. persisted cookies).
    pub fn with_session(provider: Arc<dyn IdentityProvider>, session: Session) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            current: RwLock::new(Some(session)),
            events,
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Builds the provider redirect for an OAuth sign-in.
    pub fn begin_sign_in(
        &self,
        provider: OAuthProvider,
        redirect_target: &str,
        challenge: &CodeChallenge,
    ) -> Result<Url, SessionError> {
        self.provider
            .authorize_url(provider, redirect_target, challenge)
            .inspect_err(|e| tracing::error!(error = %e, "Cannot build sign-in redirect"))
    }

    /// Trades an authorization code for a session and makes it current.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: Option<&CodeVerifier>,
    ) -> Result<Session, SessionError> {
        let session = self.provider.exchange_code(code, verifier).await?;
        *self.current.write().await = Some(session.clone());
        tracing::info!(subject = %session.subject_id(), "Signed in");
        self.publish(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// The current session, refreshed first if its access token has expired.
    ///
    /// An expired session whose refresh token is missing or rejected is
    /// dropped. When the provider cannot be reached the session is kept for a
    /// later retry and `None` is returned for this call.
    pub async fn get_session(&self) -> Option<Session> {
        {
            let current = self.current.read().await;
            match current.as_ref() {
                None => return None,
                Some(session) if !session.is_expired() => return Some(session.clone()),
                Some(_) => {}
            }
        }

        let mut current = self.current.write().await;
        // Another caller may have refreshed while we waited for the lock.
        let expired = match current.as_ref() {
            None => return None,
            Some(session) if !session.is_expired() => return Some(session.clone()),
            Some(session) => session.clone(),
        };

        let refreshed = match expired.refresh_token.as_deref() {
            Some(token) => match self.provider.refresh(token).await {
                Ok(session) => Some(session),
                Err(SessionError::Refresh(reason)) => {
                    tracing::warn!(%reason, "Refresh token rejected");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session refresh failed, keeping session");
                    return None;
                }
            },
            None => None,
        };

        match refreshed {
            Some(session) => {
                *current = Some(session.clone());
                tracing::debug!(subject = %session.subject_id(), "Session refreshed");
                self.publish(SessionEvent::TokenRefreshed(session.clone()));
                Some(session)
            }
            None => {
                *current = None;
                tracing::info!("Session expired");
                self.publish(SessionEvent::SignedOut);
                None
            }
        }
    }

    /// Ends the session. The local session is gone and listeners are told
    /// before the provider is contacted, so a provider failure never leaves
    /// the client signed in.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let Some(session) = self.current.write().await.take() else {
            return Ok(());
        };
        tracing::info!(subject = %session.subject_id(), "Signed out");
        self.publish(SessionEvent::SignedOut);

        self.provider
            .sign_out(&session.access_token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Provider sign-out failed");
                match e {
                    SessionError::SignOut(_) => e,
                    other => SessionError::SignOut(other.to_string()),
                }
            })
    }

    /// Registers `handler` for session changes. Dropping the returned
    /// [`Subscription`] unregisters it.
    pub fn on_session_change<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(SessionEvent) + Send + 'static,
    {
        Subscription::spawn(self.events.subscribe(), handler)
    }

    /// Raw event stream, for callers that want to drive their own loop.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No listeners is fine.
        let _ = self.events.send(event);
    }
}
