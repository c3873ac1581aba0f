//! Error types and handling for ChargeSync
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for ChargeSync operations
pub type Result<T> = std::result::Result<T, ChargeSyncError>;

/// Main error type for ChargeSync
#[derive(Debug, Error)]
pub enum ChargeSyncError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication against the charger API failed or is missing
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Fetching data from the charger API failed (transient)
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// A response arrived but did not have the expected shape
    #[error("Data shape error: {message}")]
    DataShape { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Charger API rejected a command
    #[error("API error: {message}")]
    Api { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ChargeSyncError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Auth {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Fetch {
            message: message.into(),
        }
    }

    /// Create a new data shape error
    pub fn data_shape<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::DataShape {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Api {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ChargeSyncError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        ChargeSyncError::Generic {
            message: message.into(),
        }
    }

    /// Whether the device must re-authenticate before polling can succeed
    pub fn is_auth(&self) -> bool {
        matches!(self, ChargeSyncError::Auth { .. })
    }
}

impl From<std::io::Error> for ChargeSyncError {
    fn from(err: std::io::Error) -> Self {
        ChargeSyncError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChargeSyncError {
    fn from(err: serde_yaml::Error) -> Self {
        ChargeSyncError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChargeSyncError {
    fn from(err: serde_json::Error) -> Self {
        ChargeSyncError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ChargeSyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChargeSyncError::timeout(err.to_string())
        } else if err.is_decode() {
            ChargeSyncError::data_shape(err.to_string())
        } else {
            ChargeSyncError::fetch(err.to_string())
        }
    }
}
