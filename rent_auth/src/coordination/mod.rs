//! The sign-in round trip: starting it, completing the provider callback and
//! routing the browser afterwards.

mod callback;
mod client;
mod destination;
mod errors;
mod server;
mod signin;
mod signout;

pub use callback::{CallbackParams, handle_client_callback};
pub use client::AuthClient;
pub use destination::Destination;
pub use errors::{CallbackError, ErrorTag};
pub use server::{ServerCallbackOptions, ServerCallbackResponse, handle_server_callback};
pub use signin::{ServerSignIn, begin_client_sign_in, begin_server_sign_in};
pub use signout::{sign_out_client, sign_out_request};
