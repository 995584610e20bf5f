//! Error handling for the EEG engine
//!
//! Every fallible operation in the workspace reports through [`EegError`].
//! Degenerate-but-valid inputs (zero denominators, missing channel pairs)
//! are not errors and never surface here.

use thiserror::Error;

/// Result type alias for EEG engine operations
pub type EegResult<T> = Result<T, EegError>;

/// Error type shared by the core, processing and streaming crates
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EegError {
    /// Signal or recording failed validation
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem
        reason: String,
    },

    /// Sample rate is zero, negative or not finite
    #[error("Invalid sampling rate: {rate}Hz, must be positive and finite")]
    InvalidSamplingRate {
        /// Provided sampling rate
        rate: f64,
    },

    /// A channel's sample count differs from the rest of the recording
    #[error("Channel {channel} has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// Offending channel
        channel: String,
        /// Sample count of the first channel
        expected: usize,
        /// Sample count of the offending channel
        actual: usize,
    },

    /// Requested channel is not part of the recording
    #[error("Unknown channel: {channel}")]
    UnknownChannel {
        /// Name that failed to resolve
        channel: String,
    },

    /// Same channel name appears twice
    #[error("Duplicate channel: {channel}")]
    DuplicateChannel {
        /// Repeated name
        channel: String,
    },

    /// Channel count exceeds maximum supported
    #[error("Too many channels: requested {requested}, max supported {max_supported}")]
    TooManyChannels {
        /// Requested channel count
        requested: usize,
        /// Maximum supported channels
        max_supported: usize,
    },

    /// Configuration failed validation or could not be (de)serialized
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration error
        message: String,
    },

    /// Streaming session misuse, e.g. ingesting while idle
    #[error("Session error: {reason}")]
    SessionError {
        /// Description of the session problem
        reason: String,
    },
}

impl EegError {
    /// True for the caller-facing input validation family
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            EegError::InvalidInput { .. }
                | EegError::InvalidSamplingRate { .. }
                | EegError::LengthMismatch { .. }
                | EegError::UnknownChannel { .. }
                | EegError::DuplicateChannel { .. }
                | EegError::TooManyChannels { .. }
        )
    }
}

impl From<serde_json::Error> for EegError {
    fn from(err: serde_json::Error) -> Self {
        EegError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

/// Convenience macro for creating input errors
#[macro_export]
macro_rules! invalid_input {
    ($($arg:tt)*) => {
        $crate::error::EegError::InvalidInput {
            reason: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::EegError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EegError::TooManyChannels {
            requested: 12,
            max_supported: 8,
        };
        let display = format!("{}", error);
        assert!(display.contains("Too many channels"));
        assert!(display.contains("12"));
        assert!(display.contains("8"));
    }

    #[test]
    fn test_macros_and_family() {
        let error = invalid_input!("signal of length {} is too short", 0);
        assert_eq!(
            error,
            EegError::InvalidInput {
                reason: "signal of length 0 is too short".to_string()
            }
        );
        assert!(error.is_invalid_input());
        assert!(!config_error!("bad").is_invalid_input());
    }
}
