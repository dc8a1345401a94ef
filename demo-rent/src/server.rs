use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, path::PathBuf};
use tokio::task::JoinHandle;

#[derive(Clone, Copy)]
pub(crate) struct Ports {
    pub(crate) http: u16,
    pub(crate) https: u16,
}

pub(crate) fn spawn_http_server(port: u16, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::debug!("HTTP server listening on {}", addr);
        if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    })
}

/// Serves HTTPS from the certificates in `self_signed_certs/`, or returns
/// `None` when they cannot be loaded.
pub(crate) async fn spawn_https_server(port: u16, app: Router) -> Option<JoinHandle<()>> {
    let certs = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("self_signed_certs");
    let config =
        match RustlsConfig::from_pem_file(certs.join("cert.pem"), certs.join("key.pem")).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("HTTPS disabled, could not load certificates: {}", e);
                return None;
            }
        };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::debug!("HTTPS server listening on {}", addr);
    Some(tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTPS server stopped: {}", e);
        }
    }))
}
