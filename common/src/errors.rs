//! Application error types.

use thiserror::Error;

/// Errors raised by the probe service.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment value could not be interpreted.
    #[error("configuration error: {0}")]
    Config(String),

    /// A relational database refused or failed the connection.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// MongoDB could not be reached or rejected the handshake.
    #[error("MongoDB connection failed: {0}")]
    MongoConnection(String),

    /// The HTTP listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server loop stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

impl AppError {
    /// Whether this error came from a connection probe rather than the process.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::DatabaseConnection(_) | Self::MongoConnection(_))
    }
}

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_classified() {
        assert!(AppError::DatabaseConnection("refused".into()).is_connection_failure());
        assert!(AppError::MongoConnection("timeout".into()).is_connection_failure());
        assert!(!AppError::Config("bad".into()).is_connection_failure());
    }

    #[test]
    fn test_bind_error_names_the_address() {
        let err = AppError::Bind {
            addr: "127.0.0.1:8080".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:8080: in use");
    }
}
