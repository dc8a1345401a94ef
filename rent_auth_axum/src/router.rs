//! Routers for the authentication endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::state::AuthContext;

/// Router for the sign-in round trip, to be nested under `AUTH_ROUTE_PREFIX`:
/// - GET  {AUTH_ROUTE_PREFIX}/signin/{provider}
/// - GET  {AUTH_ROUTE_PREFIX}/callback
/// - POST {AUTH_ROUTE_PREFIX}/signout
/// - POST {AUTH_ROUTE_PREFIX}/select-role
pub fn rent_auth_router(ctx: AuthContext) -> Router {
    rent_auth_router_no_trace(ctx).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`rent_auth_router`] without the HTTP tracing layer.
pub fn rent_auth_router_no_trace(ctx: AuthContext) -> Router {
    super::callback::router().with_state(ctx)
}

/// Application API used by the select-role page, usually nested under `/api`:
/// - POST /select-user-type
pub fn rent_api_router(ctx: AuthContext) -> Router {
    super::role::router().with_state(ctx)
}
