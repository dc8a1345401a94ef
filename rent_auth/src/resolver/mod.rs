//! Application-level auth state: the three-way outcome of cross-checking a
//! session against the application user records.

mod gate;
mod resolve;
mod state;

pub use gate::RoleGate;
pub use resolve::{Resolution, resolve, resolve_session, resolve_with_diagnostics};
pub use state::{AuthEvent, AuthState};
