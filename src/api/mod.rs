//! Seller API access
//!
//! Typed request shapes for the remote seller API, sent through the local
//! credential-injecting proxy.

pub mod client;

pub use client::{ApiError, OzonClient, API_KEY_HEADER, CLIENT_ID_HEADER, PROXY_PREFIX};
