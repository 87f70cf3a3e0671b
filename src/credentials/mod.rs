//! Persistent credential storage
//!
//! Keeps the seller client id and API key on disk so the CLI and the API
//! client pick them up across sessions.

mod store;

pub use store::{CredentialError, CredentialStore, Credentials};
