use axum::{Router, middleware::from_fn_with_state, response::Redirect, routing::get};
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rent_auth::{AUTH_OWNER_HOME, AUTH_SELECT_ROLE_PATH, AUTH_SIGNIN_PATH, AUTH_TENANT_HOME};
use rent_auth_axum::{AUTH_ROUTE_PREFIX, rent_api_router, rent_auth_router, route_guard};

mod handlers;
mod server;

use crate::{
    handlers::{login, owner_dashboard, select_role, tenant_dashboard},
    server::{Ports, spawn_http_server, spawn_https_server},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // axum-server's rustls needs a process-level CryptoProvider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,rent_auth=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ctx = rent_auth_axum::init().await?;

    let app = Router::new()
        .route("/", get(|| async { Redirect::to(AUTH_SIGNIN_PATH.as_str()) }))
        .route(AUTH_SIGNIN_PATH.as_str(), get(login))
        .route(AUTH_SELECT_ROLE_PATH.as_str(), get(select_role))
        .route(AUTH_OWNER_HOME.as_str(), get(owner_dashboard))
        .route(AUTH_TENANT_HOME.as_str(), get(tenant_dashboard))
        .nest(AUTH_ROUTE_PREFIX.as_str(), rent_auth_router(ctx.clone()))
        .nest("/api", rent_api_router(ctx.clone()))
        .layer(from_fn_with_state(ctx, route_guard));

    let ports = Ports {
        http: 3001,
        https: 3443,
    };

    let http_server = spawn_http_server(ports.http, app.clone());
    match spawn_https_server(ports.https, app).await {
        Some(https_server) => {
            tokio::try_join!(http_server, https_server)?;
        }
        None => http_server.await?,
    }
    Ok(())
}
