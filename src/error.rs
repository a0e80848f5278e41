//! Error types and handling for the surfcast application

use thiserror::Error;

/// Main error type for surfcast
#[derive(Error, Debug)]
pub enum SurfcastError {
    /// The geocoding upstream returned zero matches for a query
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// Network failure, non-success status or undecodable response body
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Ambient resolution ran out of options. Only ever logged, the caller
    /// receives the zero-coordinate fallback instead.
    #[error("Could not resolve a location for '{name}'")]
    ResolutionExhausted { name: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SurfcastError {
    /// Create a new not-found error for a geocoding query
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SurfcastError::NotFound { query } => {
                format!("Location not found: '{query}'. Try a different city, town or postcode.")
            }
            SurfcastError::Transport { message } => {
                format!("Unable to reach the forecast service ({message}). Please try again.")
            }
            SurfcastError::ResolutionExhausted { name } => {
                format!("Could not pinpoint '{name}', using a default location.")
            }
            SurfcastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SurfcastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SurfcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            SurfcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
