#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, Response, header},
    middleware::from_fn_with_state,
    routing::get,
};
use tower::ServiceExt;

use rent_auth::test_utils::{CountingUserStore, MockIdentityProvider};
use rent_auth::{
    AUTH_ACCESS_COOKIE_NAME, AUTH_REFRESH_COOKIE_NAME, AUTH_ROUTE_PREFIX, InMemoryAppUserStore,
    Session,
};
use rent_auth_axum::{
    AuthContext, AuthSession, CurrentAuthState, RequireOwner, RequireTenant, rent_api_router,
    rent_auth_router_no_trace, route_guard,
};

pub struct TestApp {
    pub provider: Arc<MockIdentityProvider>,
    pub users: Arc<CountingUserStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new(provider: MockIdentityProvider, users: InMemoryAppUserStore) -> Self {
        let provider = Arc::new(provider);
        let users = Arc::new(CountingUserStore::new(users));
        let ctx = AuthContext::new(provider.clone(), users.clone());

        let router = Router::new()
            .route("/login", get(|| async { "login" }))
            .route(
                "/dashboard/profile",
                get(|auth: AuthSession| async move { auth.subject_id().to_string() }),
            )
            .route(
                "/select-role",
                get(|CurrentAuthState(state): CurrentAuthState| async move { state.to_string() }),
            )
            .route("/dashboard/owner", get(|_: RequireOwner| async { "owner" }))
            .route("/dashboard/tenant", get(|_: RequireTenant| async { "tenant" }))
            .nest(AUTH_ROUTE_PREFIX.as_str(), rent_auth_router_no_trace(ctx.clone()))
            .nest("/api", rent_api_router(ctx.clone()))
            .layer(from_fn_with_state(ctx, route_guard));

        Self {
            provider,
            users,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub fn session_cookie(session: &Session) -> String {
    let mut cookie = format!("{}={}", *AUTH_ACCESS_COOKIE_NAME, session.access_token);
    if let Some(refresh) = &session.refresh_token {
        cookie.push_str(&format!("; {}={}", *AUTH_REFRESH_COOKIE_NAME, refresh));
    }
    cookie
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(HeaderValue::to_str)
        .map(|v| v.unwrap().to_string())
        .collect()
}

/// `name=value` pair of a `Set-Cookie` header that sets (not clears) `name`.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .filter(|c| c.starts_with(&format!("{name}=")) && !c.contains("Max-Age=0"))
        .map(|c| c.split(';').next().unwrap_or_default().to_string())
        .next()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
