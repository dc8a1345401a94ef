//! Client for the dashboard REST API, limited to the calls the sign-in flow
//! makes.

mod client;
mod errors;
mod types;

pub use client::{API_URL, ApiClient};
pub use errors::ApiError;
pub use types::{SelectUserTypeRequest, SelectUserTypeResponse};
