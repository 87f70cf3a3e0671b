//! Credential-injecting reverse proxy for the seller API
//!
//! Accepts `POST /api/ozon/<path>` with a JSON body and forwards it to
//! `<base_url>/<path>`, attaching the client id and API key either from the
//! request's `X-Ozon-*` headers or from the server configuration.

mod handler;

use axum::routing::post;
use axum::Router;

use crate::api::PROXY_PREFIX;
use crate::config::ProxyConfig;

pub use handler::{forward, ProxyState};

/// Builds the proxy router
pub fn router(config: ProxyConfig) -> Router {
    Router::new()
        .route(&format!("{}/*path", PROXY_PREFIX), post(forward))
        .with_state(ProxyState::new(config))
}

/// Binds `config.bind` and serves the proxy until the process stops
pub async fn serve(config: ProxyConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        upstream = %config.base_url,
        "proxy listening"
    );
    axum::serve(listener, router(config)).await
}
