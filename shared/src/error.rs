//! Error types shared by the editor client and the gallery server.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::AssetId;

/// Failure returned by the asset persistence API.
///
/// Travels over the wire inside response messages, so it stays plain data
/// (no boxed sources).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistError {
    /// Missing, unknown or expired bearer credential (the 401 case).
    #[error("missing or expired credential")]
    Unauthorized,

    /// The request payload failed validation on the server.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The referenced asset is not in the catalog.
    #[error("asset {0} does not exist")]
    UnknownAsset(AssetId),

    /// The server accepted the request but could not write it.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The request never reached the server or the link dropped while waiting.
    #[error("server unreachable: {0}")]
    Network(String),
}

impl PersistError {
    /// Auth failures reset the whole editing session instead of showing a retryable error.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, PersistError::Unauthorized)
    }
}

/// Failure loading a RON configuration or room description file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_an_auth_failure() {
        assert!(PersistError::Unauthorized.is_auth_failure());
        assert!(!PersistError::Network("timeout".into()).is_auth_failure());
        assert!(!PersistError::Storage("disk full".into()).is_auth_failure());
        assert!(!PersistError::UnknownAsset(7).is_auth_failure());
    }

    #[test]
    fn messages_name_the_asset() {
        assert_eq!(PersistError::UnknownAsset(42).to_string(), "asset 42 does not exist");
    }
}
