//! rent-auth-axum - axum integration for rent-auth
//!
//! Provides the sign-in, callback and sign-out routes, the role selection
//! API, a route guard for protected paths and extractors for handlers that
//! need the resolved session or a specific role.

mod callback;
mod error;
mod middleware;
mod role;
mod router;
mod session;
mod state;

pub use error::IntoResponseError;
pub use middleware::route_guard;
pub use router::{rent_api_router, rent_auth_router, rent_auth_router_no_trace};
pub use session::{
    AuthRedirect, AuthSession, CurrentAuthState, Owner, RequireOwner, RequireRole, RequireTenant,
    RequiredRole, RoleRejection, Tenant,
};
pub use state::{AuthContext, init};

// Re-export the route prefix from the core crate
pub use rent_auth::AUTH_ROUTE_PREFIX;
