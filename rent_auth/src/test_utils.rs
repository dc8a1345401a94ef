//! In-process stand-ins for the identity provider and user store, for unit
//! tests here and for the axum crate's integration tests (`test-utils`
//! feature).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::pkce::{CHALLENGE_METHOD, CodeChallenge, CodeVerifier, derive_challenge};
use crate::session::{IdentityProvider, OAuthProvider, Session, SessionError, SessionUser};
use crate::userdb::{AppUserStore, ApplicationUser, InMemoryAppUserStore, LookupError, Role};
use crate::utils::base64url_encode;

/// Unsigned JWT-shaped token carrying `sub` and `exp` claims.
pub fn fake_jwt(subject: &str, exp: i64) -> String {
    let header = base64url_encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = serde_json::json!({ "sub": subject, "exp": exp });
    let payload = base64url_encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.unsigned")
}

#[derive(Default)]
struct MockState {
    /// Authorization code -> subject.
    codes: HashMap<String, String>,
    used_codes: HashSet<String>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    last_challenge: Option<CodeChallenge>,
    issued: u64,
}

/// Identity provider double with call counters.
///
/// Codes registered with [`MockIdentityProvider::with_code`] are single use.
/// Exchange requires a verifier (unless [`MockIdentityProvider::without_pkce`])
/// and, once an authorize URL has been built, checks it against the last
/// challenge.
#[derive(Default)]
pub struct MockIdentityProvider {
    state: Mutex<MockState>,
    require_verifier: bool,
    fail_authorize: bool,
    fail_sign_out: bool,
    unreachable: bool,
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    get_user_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            require_verifier: true,
            ..Default::default()
        }
    }

    pub fn with_code(self, code: &str, subject: &str) -> Self {
        self.add_code(code, subject);
        self
    }

    /// Accepts exchanges that carry no verifier.
    pub fn without_pkce(mut self) -> Self {
        self.require_verifier = false;
        self
    }

    pub fn failing_authorize(mut self) -> Self {
        self.fail_authorize = true;
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    /// Every network operation fails as if the provider were down.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn add_code(&self, code: &str, subject: &str) {
        self.lock()
            .codes
            .insert(code.to_string(), subject.to_string());
    }

    /// Issues tokens for `subject` as if it had signed in earlier.
    pub fn issue_session(&self, subject: &str, expired: bool) -> Session {
        let expires_at = if expired {
            Utc::now() - Duration::minutes(5)
        } else {
            Utc::now() + Duration::hours(1)
        };
        self.mint(&mut self.lock(), subject, expires_at)
    }

    pub fn last_challenge(&self) -> Option<CodeChallenge> {
        self.lock().last_challenge.clone()
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mint(&self, state: &mut MockState, subject: &str, expires_at: DateTime<Utc>) -> Session {
        state.issued += 1;
        let access_token = format!(
            "{}{}",
            fake_jwt(subject, expires_at.timestamp()),
            state.issued
        );
        let refresh_token = format!("refresh-{subject}-{}", state.issued);
        state
            .access_tokens
            .insert(access_token.clone(), subject.to_string());
        state
            .refresh_tokens
            .insert(refresh_token.clone(), subject.to_string());
        Session {
            access_token,
            refresh_token: Some(refresh_token),
            expires_at,
            user: user(subject),
        }
    }
}

fn user(subject: &str) -> SessionUser {
    SessionUser {
        id: subject.to_string(),
        email: Some(format!("{subject}@example.com")),
        user_metadata: serde_json::json!({ "full_name": subject }),
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &CodeChallenge,
    ) -> Result<Url, SessionError> {
        if self.fail_authorize {
            return Err(SessionError::Provider(format!(
                "{provider} is not enabled"
            )));
        }
        self.lock().last_challenge = Some(challenge.clone());
        let mut url = Url::parse("http://idp.test/auth/v1/authorize")
            .map_err(|e| SessionError::Provider(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: Option<&CodeVerifier>,
    ) -> Result<Session, SessionError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(SessionError::Exchange("connection refused".to_string()));
        }
        let mut state = self.lock();
        if state.used_codes.contains(code) {
            return Err(SessionError::Exchange("code already used".to_string()));
        }
        let Some(subject) = state.codes.get(code).cloned() else {
            return Err(SessionError::Exchange("invalid code".to_string()));
        };
        match (verifier, &state.last_challenge) {
            (None, _) if self.require_verifier => {
                return Err(SessionError::Exchange("code verifier required".to_string()));
            }
            (Some(v), Some(challenge)) if derive_challenge(v) != *challenge => {
                return Err(SessionError::Exchange("code verifier mismatch".to_string()));
            }
            _ => {}
        }
        state.used_codes.insert(code.to_string());
        Ok(self.mint(&mut state, &subject, Utc::now() + Duration::hours(1)))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(SessionError::Transport("connection refused".to_string()));
        }
        let mut state = self.lock();
        // Refresh tokens rotate.
        let Some(subject) = state.refresh_tokens.remove(refresh_token) else {
            return Err(SessionError::Refresh("invalid refresh token".to_string()));
        };
        Ok(self.mint(&mut state, &subject, Utc::now() + Duration::hours(1)))
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser, SessionError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(SessionError::Transport("connection refused".to_string()));
        }
        self.lock()
            .access_tokens
            .get(access_token)
            .map(String::as_str)
            .map(user)
            .ok_or(SessionError::Unauthorized)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable || self.fail_sign_out {
            return Err(SessionError::SignOut("provider unavailable".to_string()));
        }
        self.lock().access_tokens.remove(access_token);
        Ok(())
    }
}

/// [`InMemoryAppUserStore`] that counts lookups.
pub struct CountingUserStore {
    inner: InMemoryAppUserStore,
    lookups: AtomicUsize,
}

impl CountingUserStore {
    pub fn new(inner: InMemoryAppUserStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppUserStore for CountingUserStore {
    async fn find_by_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<ApplicationUser>, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_subject(subject_id).await
    }

    async fn provision(
        &self,
        subject_id: &str,
        role: Role,
    ) -> Result<ApplicationUser, LookupError> {
        self.inner.provision(subject_id, role).await
    }
}
