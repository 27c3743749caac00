//! Cache connector error types

use thiserror::Error;

/// Cache connector errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Not connected: call connect() before using the remote cache manager")]
    NotConnected,

    #[error("Remote cache manager has been stopped")]
    Stopped,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Schema registration failed for {name}: {message}")]
    Schema { name: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_display() {
        let error = CacheError::NotConnected;
        assert_eq!(
            error.to_string(),
            "Not connected: call connect() before using the remote cache manager"
        );
    }

    #[test]
    fn test_server_error_display() {
        let error = CacheError::Server {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(error.to_string(), "Server returned 401: Unauthorized");
    }

    #[test]
    fn test_serde_error_conversion() {
        let err = serde_json::from_str::<f32>("not a number").unwrap_err();
        let error: CacheError = err.into();
        assert!(matches!(error, CacheError::Serialization(_)));
    }
}
