//! Application user records: which role a signed-in subject holds.

mod config;
mod errors;
mod postgres;
mod sqlite;
mod store;
mod types;

pub use config::{APP_USER_STORE_URL, connect_app_user_store};
pub use errors::LookupError;
pub use postgres::PostgresAppUserStore;
pub use sqlite::SqliteAppUserStore;
pub use store::{AppUserStore, InMemoryAppUserStore};
pub use types::{ApplicationUser, Role};
