//! Error types for sqldeploy.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for sqldeploy operations.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Configuration errors (invalid config file, missing URL or key, bad rule, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Script file errors (not found, permission denied, etc.)
    #[error("File error: {0}")]
    File(String),

    /// Script content that is not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Remote call failures (network errors, unexpected responses, etc.)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl DeployError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a file error with the given message.
    pub fn file(msg: impl Into<String>) -> Self {
        Self::File(msg.into())
    }

    /// Creates an encoding error with the given message.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::File(_) => "File Error",
            Self::Encoding(_) => "Encoding Error",
            Self::Transport(_) => "Transport Error",
        }
    }
}

/// Result type alias using DeployError.
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = DeployError::config("SUPABASE_URL is not set");
        assert_eq!(
            err.to_string(),
            "Configuration error: SUPABASE_URL is not set"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_file() {
        let err = DeployError::file("supabase/schema.sql: No such file or directory");
        assert_eq!(
            err.to_string(),
            "File error: supabase/schema.sql: No such file or directory"
        );
        assert_eq!(err.category(), "File Error");
    }

    #[test]
    fn test_error_display_encoding() {
        let err = DeployError::encoding("invalid UTF-8 at byte 12");
        assert_eq!(err.to_string(), "Encoding error: invalid UTF-8 at byte 12");
        assert_eq!(err.category(), "Encoding Error");
    }

    #[test]
    fn test_error_display_transport() {
        let err = DeployError::transport("connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
        assert_eq!(err.category(), "Transport Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DeployError>();
    }
}
