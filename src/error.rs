//! Error types and handling for `aqiwatch`

use std::time::Duration;
use thiserror::Error;

/// Main error type for the `aqiwatch` library
#[derive(Error, Debug)]
pub enum AqiwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures talking to the telemetry endpoint
    #[error("Network error: {message}")]
    Network { message: String },

    /// Telemetry endpoint answered with a non-success status
    #[error("Telemetry endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// Response body could not be decoded into station records
    #[error("Malformed telemetry payload: {message}")]
    Decode { message: String },

    /// Fetch did not complete within the configured deadline
    #[error("Telemetry fetch timed out after {after:?}")]
    Timeout { after: Duration },

    /// Rendering surface failures
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AqiwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Status { status }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// True for failures of the telemetry fetch itself, as opposed to local problems
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Status { .. } | Self::Decode { .. } | Self::Timeout { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AqiwatchError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            AqiwatchError::Network { .. } | AqiwatchError::Timeout { .. } => {
                "Unable to reach the air-quality service. Please check your connection."
                    .to_string()
            }
            AqiwatchError::Status { status } => {
                format!("The air-quality service is unavailable (HTTP {status}).")
            }
            AqiwatchError::Decode { .. } => {
                "The air-quality service sent data we could not read.".to_string()
            }
            AqiwatchError::Render { message } => format!("Could not draw the view: {message}"),
            AqiwatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest_middleware::Error> for AqiwatchError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::network(err.to_string())
    }
}
