//! Forwarding handler for the seller API proxy

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use reqwest::Client;
use serde_json::{json, Value};

use crate::api::{API_KEY_HEADER, CLIENT_ID_HEADER, PROXY_PREFIX};
use crate::config::ProxyConfig;

/// Credential headers expected by the upstream API
const UPSTREAM_CLIENT_ID_HEADER: &str = "Client-Id";
const UPSTREAM_API_KEY_HEADER: &str = "Api-Key";

/// Shared state of the proxy routes
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub client: Client,
    pub config: Arc<ProxyConfig>,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

/// Returns the header value, or `fallback` when the header is absent
///
/// A present but empty header still wins over the fallback.
fn header_or<'a>(headers: &'a HeaderMap, name: &str, fallback: &'a str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback)
}

/// Upstream path of a proxied request, still percent-encoded
fn upstream_path(uri: &Uri) -> &str {
    let path = uri.path();
    let rest = path.strip_prefix(PROXY_PREFIX).unwrap_or(path);
    rest.strip_prefix('/').unwrap_or(rest)
}

/// Forwards a JSON POST to the upstream API with credentials attached
///
/// Upstream status and body are passed through unchanged. A transport or
/// decode failure becomes a generic 500; the cause is only logged.
pub async fn forward(
    State(state): State<ProxyState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let target = format!("{}/{}", state.config.base_url, upstream_path(&uri));
    let client_id = header_or(&headers, CLIENT_ID_HEADER, &state.config.credentials.client_id);
    let api_key = header_or(&headers, API_KEY_HEADER, &state.config.credentials.api_key);

    match send_upstream(&state.client, &target, client_id, api_key, &body).await {
        Ok((status, data)) => {
            tracing::debug!(%target, status = status.as_u16(), "proxied request");
            (status, Json(data))
        }
        Err(err) => {
            tracing::error!(%target, error = %err, "Ozon API proxy error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
        }
    }
}

async fn send_upstream(
    client: &Client,
    target: &str,
    client_id: &str,
    api_key: &str,
    body: &Value,
) -> Result<(StatusCode, Value), reqwest::Error> {
    let response = client
        .post(target)
        .header(UPSTREAM_CLIENT_ID_HEADER, client_id)
        .header(UPSTREAM_API_KEY_HEADER, api_key)
        .json(body)
        .send()
        .await?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let data = response.json::<Value>().await?;
    Ok((status, data))
}
