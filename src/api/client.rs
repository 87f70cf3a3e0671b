//! Seller API client routed through the local proxy
//!
//! This module posts JSON requests to the proxy endpoint, which forwards them
//! to the remote seller API with credentials attached.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::Credentials;

/// Path prefix the proxy listens on
pub const PROXY_PREFIX: &str = "/api/ozon";

/// Header carrying the client id to the proxy
pub const CLIENT_ID_HEADER: &str = "X-Ozon-Client-Id";

/// Header carrying the API key to the proxy
pub const API_KEY_HEADER: &str = "X-Ozon-Api-Key";

/// Page size used for list requests
const PAGE_LIMIT: u32 = 1000;

/// Errors that can occur when calling the seller API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The proxy answered with a non-success status
    #[error("Ozon API error: {reason}")]
    Status { status: u16, reason: String },
}

/// Body of a stock listing request
#[derive(Debug, Clone, Serialize)]
struct StocksRequest {
    filter: StocksFilter,
    limit: u32,
}

#[derive(Debug, Clone, Serialize)]
struct StocksFilter {
    visibility: &'static str,
}

/// Body of an FBO posting listing request
#[derive(Debug, Clone, Serialize)]
struct FboPostingsRequest {
    dir: &'static str,
    filter: PostingFilter,
    limit: u32,
    offset: u32,
    with: PostingExtras,
}

#[derive(Debug, Clone, Serialize)]
struct PostingFilter {
    since: DateTime<Utc>,
    to: DateTime<Utc>,
    status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct PostingExtras {
    analytics_data: bool,
    financial_data: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ProductPicturesRequest<'a> {
    product_id: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
struct ProductInfoRequest<'a> {
    sku: &'a [u64],
}

/// Client for the seller API behind the proxy
#[derive(Debug, Clone)]
pub struct OzonClient {
    client: Client,
    /// Origin of the proxy, e.g. `http://127.0.0.1:8787`
    base_url: String,
    credentials: Credentials,
}

impl OzonClient {
    /// Create a new OzonClient talking to the proxy at `base_url`
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    /// Create a new OzonClient with a custom HTTP client
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to the seller API `path` through the proxy
    ///
    /// # Arguments
    /// * `path` - Seller API path, e.g. `/v4/product/info/stocks`
    /// * `body` - JSON-serializable request body
    ///
    /// # Returns
    /// * `Ok(Value)` - Decoded JSON response
    /// * `Err(ApiError)` - If the request fails or the status is not a success
    pub async fn call<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = format!("{}{}{}", self.base_url, PROXY_PREFIX, path);

        let response = self
            .client
            .post(&url)
            .header(CLIENT_ID_HEADER, &self.credentials.client_id)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Stock levels for all products
    pub async fn stocks(&self) -> Result<Value, ApiError> {
        let body = StocksRequest {
            filter: StocksFilter { visibility: "ALL" },
            limit: PAGE_LIMIT,
        };
        self.call("/v4/product/info/stocks", &body).await
    }

    /// FBO postings created between `since` and `to`, oldest first
    pub async fn fbo_postings(
        &self,
        since: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Value, ApiError> {
        let body = FboPostingsRequest {
            dir: "ASC",
            filter: PostingFilter {
                since,
                to,
                status: "",
            },
            limit: PAGE_LIMIT,
            offset: 0,
            with: PostingExtras {
                analytics_data: true,
                financial_data: true,
            },
        };
        self.call("/v2/posting/fbo/list", &body).await
    }

    /// Picture URLs for the given product ids
    pub async fn product_images(&self, product_ids: &[String]) -> Result<Value, ApiError> {
        self.call(
            "/v2/product/pictures/info",
            &ProductPicturesRequest {
                product_id: product_ids,
            },
        )
        .await
    }

    /// Product details for the given SKUs
    pub async fn product_info_list(&self, skus: &[u64]) -> Result<Value, ApiError> {
        self.call("/v3/product/info/list", &ProductInfoRequest { sku: skus })
            .await
    }
}
