//! Domain error types
//!
//! This module defines the error hierarchy for Octoform. Errors are domain-specific and
//! don't expose third-party types; conversions from I/O, JSON and TOML errors flatten the
//! source into a message.

use super::kind::ResourceKind;
use thiserror::Error;

/// Main Octoform error type
///
/// This is the primary error type used throughout the application. Any variant returned
/// from an export entry point aborts the run before output is written.
#[derive(Debug, Error)]
pub enum OctoformError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source platform errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A deferred render function failed
    #[error("Failed to render {kind} '{id}': {message}")]
    Render {
        kind: ResourceKind,
        id: String,
        message: String,
    },

    /// A reference could not be resolved while strict references are enabled
    #[error("Unresolved reference to {kind} '{id}'")]
    UnresolvedReference { kind: ResourceKind, id: String },

    /// Registry misuse (e.g. rendering before the registry was frozen)
    #[error("Registry error: {0}")]
    Registry(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl OctoformError {
    /// Whether the error came from talking to the source platform
    pub fn is_source_error(&self) -> bool {
        matches!(self, OctoformError::Source(_))
    }
}

/// Source platform errors
///
/// Errors that occur when reading a space from the deployment platform.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the server
    #[error("Failed to connect to server: {0}")]
    ConnectionFailed(String),

    /// Authentication or authorization failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 401/403/404)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Payload did not match the expected shape
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for OctoformError {
    fn from(err: std::io::Error) -> Self {
        OctoformError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for OctoformError {
    fn from(err: serde_json::Error) -> Self {
        OctoformError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for OctoformError {
    fn from(err: toml::de::Error) -> Self {
        OctoformError::Configuration(format!("TOML parse error: {err}"))
    }
}
