//! Error types and handling for the `TourGuide` application

use thiserror::Error;

/// Main error type for the `TourGuide` application
#[derive(Error, Debug)]
pub enum TourGuideError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Collaborator API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A call or stage ran past its deadline
    #[error("Timed out: {message}")]
    Timeout { message: String },
}

impl TourGuideError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TourGuideError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            TourGuideError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            TourGuideError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TourGuideError::Timeout { .. } => {
                "The request took too long. Please try again.".to_string()
            }
        }
    }
}
