//! Request extractors for the session the route guard resolved.

use std::marker::PhantomData;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};

use rent_auth::{
    AUTH_SELECT_ROLE_PATH, AUTH_SIGNIN_PATH, AppUserStore, AuthState, Destination, Role, RoleGate,
    Session, resolve_session,
};

/// Session the route guard attached to the request.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub session: Session,
}

impl AuthSession {
    pub fn subject_id(&self) -> &str {
        self.session.subject_id()
    }
}

/// User store the guard leaves on the request for role extractors.
#[derive(Clone)]
pub(crate) struct SessionUsers(pub(crate) Arc<dyn AppUserStore>);

#[derive(Clone, Copy)]
struct ResolvedState(AuthState);

/// Looks up the application user at most once per request.
async fn auth_state(parts: &mut Parts) -> AuthState {
    if let Some(ResolvedState(state)) = parts.extensions.get::<ResolvedState>() {
        return *state;
    }
    let (Some(auth), Some(SessionUsers(users))) = (
        parts.extensions.get::<AuthSession>(),
        parts.extensions.get::<SessionUsers>(),
    ) else {
        return AuthState::Unauthenticated;
    };
    let (session, users) = (auth.session.clone(), users.clone());

    let state = resolve_session(Some(&session), users.as_ref()).await;
    parts.extensions.insert(ResolvedState(state));
    state
}

/// Redirects the browser to the sign-in page.
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(AUTH_SIGNIN_PATH.as_str()).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthSession>().cloned().ok_or_else(|| {
            tracing::debug!("No resolved session on request");
            AuthRedirect
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthSession>().cloned())
    }
}

/// The [`AuthState`] of the guarded session; `Unauthenticated` when the
/// guard did not run or found no session.
#[derive(Clone, Copy, Debug)]
pub struct CurrentAuthState(pub AuthState);

impl<S> FromRequestParts<S> for CurrentAuthState
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(auth_state(parts).await))
    }
}

/// Type-level role requirement for [`RequireRole`].
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct Owner;

impl RequiredRole for Owner {
    const ROLE: Role = Role::Owner;
}

pub struct Tenant;

impl RequiredRole for Tenant {
    const ROLE: Role = Role::Tenant;
}

/// Admits only sessions whose application user holds `R::ROLE`.
pub struct RequireRole<R: RequiredRole> {
    pub auth: AuthSession,
    _role: PhantomData<R>,
}

pub type RequireOwner = RequireRole<Owner>;
pub type RequireTenant = RequireRole<Tenant>;

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RequiredRole,
{
    type Rejection = RoleRejection;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts.extensions.get::<AuthSession>().cloned() else {
            return Err(RoleRejection::SignIn);
        };
        match RoleGate::check(auth_state(parts).await, R::ROLE) {
            RoleGate::Granted => Ok(Self {
                auth,
                _role: PhantomData,
            }),
            RoleGate::SignInRequired => Err(RoleRejection::SignIn),
            RoleGate::ProvisioningRequired => Err(RoleRejection::SelectRole),
            RoleGate::AccessDenied { required, actual } => {
                tracing::warn!(
                    subject = %auth.subject_id(),
                    %required,
                    %actual,
                    "Role mismatch"
                );
                Err(RoleRejection::AccessDenied { required, actual })
            }
        }
    }
}

#[derive(Debug)]
pub enum RoleRejection {
    SignIn,
    SelectRole,
    AccessDenied { required: Role, actual: Role },
}

#[derive(Template)]
#[template(path = "access_denied.html")]
struct AccessDeniedTemplate {
    required: Role,
    actual: Role,
    home: String,
}

impl IntoResponse for RoleRejection {
    fn into_response(self) -> Response {
        match self {
            Self::SignIn => AuthRedirect.into_response(),
            Self::SelectRole => Redirect::to(AUTH_SELECT_ROLE_PATH.as_str()).into_response(),
            Self::AccessDenied { required, actual } => {
                let template = AccessDeniedTemplate {
                    required,
                    actual,
                    home: Destination::Home(actual).path(),
                };
                match template.render() {
                    Ok(html) => (StatusCode::FORBIDDEN, Html(html)).into_response(),
                    Err(e) => {
                        tracing::error!("Failed to render access denied page: {}", e);
                        (StatusCode::FORBIDDEN, "Access denied").into_response()
                    }
                }
            }
        }
    }
}
