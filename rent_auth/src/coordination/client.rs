use std::sync::Arc;

use http::HeaderMap;
use tokio::sync::Mutex;
use url::Url;

use crate::api::{ApiClient, ApiError};
use crate::pkce::PkceStore;
use crate::resolver::{AuthEvent, AuthState, resolve, resolve_session};
use crate::session::{OAuthProvider, SessionClient, Subscription};
use crate::userdb::{AppUserStore, Role};

use super::callback::{CallbackParams, handle_client_callback};
use super::destination::Destination;
use super::errors::CallbackError;
use super::signin::begin_client_sign_in;
use super::signout::sign_out_client;

/// Everything one browsing context needs to sign in, resolve its state and
/// pick a role.
pub struct AuthClient {
    session: Arc<SessionClient>,
    users: Arc<dyn AppUserStore>,
    verifiers: Mutex<PkceStore>,
    api: ApiClient,
}

impl AuthClient {
    pub fn new(
        session: Arc<SessionClient>,
        users: Arc<dyn AppUserStore>,
        verifiers: PkceStore,
        api: ApiClient,
    ) -> Self {
        Self {
            session,
            users,
            verifiers: Mutex::new(verifiers),
            api,
        }
    }

    pub fn session_client(&self) -> &Arc<SessionClient> {
        &self.session
    }

    /// Provider URL to send the browser to.
    pub async fn begin_sign_in(&self, provider: OAuthProvider) -> Result<Url, CallbackError> {
        let mut verifiers = self.verifiers.lock().await;
        begin_client_sign_in(&self.session, &mut verifiers, provider, None).await
    }

    pub async fn complete_callback(&self, params: &CallbackParams) -> Destination {
        let mut verifiers = self.verifiers.lock().await;
        handle_client_callback(params, &self.session, &mut *verifiers, self.users.as_ref()).await
    }

    pub async fn auth_state(&self) -> AuthState {
        resolve(&self.session, self.users.as_ref()).await
    }

    pub async fn sign_out(&self) -> Result<(), CallbackError> {
        let mut verifiers = self.verifiers.lock().await;
        sign_out_client(&self.session, &mut verifiers).await
    }

    /// Provisions the signed-in user with `role` through the API, then
    /// re-resolves.
    pub async fn select_role(&self, role: Role) -> Result<AuthState, ApiError> {
        let Some(session) = self.session.get_session().await else {
            return Err(ApiError::Rejected("Not signed in".to_string()));
        };
        self.api
            .select_user_type(&session.access_token, role)
            .await?;
        Ok(resolve_session(Some(&session), self.users.as_ref()).await)
    }

    /// Verifier cookie writes produced so far, handed over for the browser.
    pub async fn take_cookie_headers(&self) -> HeaderMap {
        self.verifiers.lock().await.take_cookie_headers()
    }

    /// Calls `handler` with the auth event implied by each session change.
    pub fn on_auth_event<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut(AuthEvent) + Send + 'static,
    {
        self.session.on_session_change(move |event| {
            if let Some(auth_event) = AuthEvent::from_session_event(&event) {
                handler(auth_event);
            }
        })
    }
}
