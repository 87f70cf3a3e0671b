//! Credential store persisting API keys to disk
//!
//! Provides a `CredentialStore` that keeps the client id and API key in a JSON
//! file so they survive across sessions.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the credential file inside the config directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Errors that can occur when saving credentials
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Creating the directory or writing the file failed
    #[error("Failed to write credentials to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Credentials could not be encoded
    #[error("Failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Seller API credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Seller client id
    #[serde(default)]
    pub client_id: String,
    /// Seller API key
    #[serde(default)]
    pub api_key: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns true if neither value has been set
    pub fn is_empty(&self) -> bool {
        self.client_id.is_empty() && self.api_key.is_empty()
    }

    /// API key with all but the last four characters hidden
    ///
    /// Keys shorter than eight characters are hidden entirely.
    pub fn masked_api_key(&self) -> String {
        let len = self.api_key.chars().count();
        if len < 8 {
            return "*".repeat(len);
        }
        let visible: String = self.api_key.chars().skip(len - 4).collect();
        format!("{}{}", "*".repeat(len - 4), visible)
    }
}

/// Reads and writes credentials on disk
///
/// Credentials live in an XDG-compliant config directory
/// (`~/.config/swrkit/credentials.json` on Linux). A missing or unreadable
/// file reads as empty credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// Path of the credential file
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a CredentialStore in the XDG-compliant config directory
    ///
    /// Returns `None` if the config directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "swrkit")?;
        let path = project_dirs.config_dir().join(CREDENTIALS_FILE);
        Some(Self { path })
    }

    /// Creates a CredentialStore backed by a specific file
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credentials, or empty credentials if there are none
    pub fn load(&self) -> Credentials {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Credentials::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable credential file");
            Credentials::default()
        })
    }

    /// Persists `credentials`, creating the directory if needed
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, json).map_err(io_err)
    }

    /// Loads, applies `change`, saves, and returns the new credentials
    pub fn update(
        &self,
        change: impl FnOnce(&mut Credentials),
    ) -> Result<Credentials, CredentialError> {
        let mut credentials = self.load();
        change(&mut credentials);
        self.save(&credentials)?;
        Ok(credentials)
    }
}
