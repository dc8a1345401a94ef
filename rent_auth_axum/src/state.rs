use std::sync::Arc;

use rent_auth::{AppUserStore, HttpIdentityProvider, IdentityProvider, connect_app_user_store};

/// Shared handles every auth route and the route guard work with.
#[derive(Clone)]
pub struct AuthContext {
    pub provider: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn AppUserStore>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn AppUserStore>) -> Self {
        Self { provider, users }
    }
}

/// Builds the context from the environment: the HTTP identity provider at
/// `IDP_URL` and the user store at `APP_USER_STORE_URL`.
pub async fn init() -> Result<AuthContext, Box<dyn std::error::Error>> {
    let provider = HttpIdentityProvider::from_env()?;
    let users = connect_app_user_store().await?;
    tracing::info!("Auth context initialized");
    Ok(AuthContext::new(Arc::new(provider), users))
}
