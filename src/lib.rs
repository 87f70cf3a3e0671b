//! swrkit library
//!
//! Stale-while-revalidate cache, seller API client, credential store and the
//! credential-injecting proxy. The binary and integration tests build on these.

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod proxy;
pub mod swr;
