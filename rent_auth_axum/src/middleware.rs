use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::HeaderMap;

use rent_auth::{
    AUTH_SIGNIN_PATH, is_protected_path, merge_set_cookies, resolve_request_session,
    secure_cookies,
};

use super::session::{AuthSession, SessionUsers};
use super::state::AuthContext;

/// Route guard for protected path prefixes.
///
/// Requests without a usable session are sent to the sign-in page with the
/// original query string dropped. Otherwise the resolved [`AuthSession`] is
/// attached to the request and any refreshed session cookies are added to
/// the response. The application user is looked up only by extractors that
/// need a role.
///
/// ```ignore
/// let app = Router::new()
///     .route("/dashboard/owner", get(owner_home))
///     .layer(axum::middleware::from_fn_with_state(ctx.clone(), route_guard));
/// ```
pub async fn route_guard(State(ctx): State<AuthContext>, mut req: Request, next: Next) -> Response {
    if !is_protected_path(req.uri().path()) {
        return next.run(req).await;
    }

    let secure = secure_cookies(req.headers());
    let resolved = match resolve_request_session(ctx.provider.as_ref(), req.headers(), secure).await
    {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), error = %e, "Session check failed");
            return sign_in_redirect(HeaderMap::new());
        }
    };

    let Some(session) = resolved.session else {
        tracing::debug!(path = %req.uri().path(), "No session, redirecting to sign-in");
        return sign_in_redirect(resolved.cookies);
    };

    req.extensions_mut().insert(AuthSession { session });
    req.extensions_mut().insert(SessionUsers(ctx.users.clone()));

    let mut response = next.run(req).await;
    merge_set_cookies(response.headers_mut(), &resolved.cookies);
    response
}

fn sign_in_redirect(cookies: HeaderMap) -> Response {
    (cookies, Redirect::to(AUTH_SIGNIN_PATH.as_str())).into_response()
}
