//! Error types for the event recorder

use std::path::PathBuf;

use eventlog_proto::EncodeError;
use thiserror::Error;

/// Main error type for event recorder operations
#[derive(Error, Debug)]
pub enum EventLogError {
    /// Target directory is missing at construction time
    #[error("Log directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Computed event file path is already taken
    #[error("Event file already exists: {}", .0.display())]
    FileExists(PathBuf),

    /// Tag is empty or starts with the separator
    #[error("Invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: &'static str },

    /// Scope name is empty or contains the separator
    #[error("Invalid tag scope name {0:?}")]
    InvalidScopeName(String),

    /// Unusable configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Payload could not be turned into a summary value
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Writing the event file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using EventLogError
pub type EventLogResult<T> = Result<T, EventLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EventLogError::InvalidTag {
            tag: "/loss".to_string(),
            reason: "starts with the separator",
        };
        assert_eq!(
            format!("{}", err),
            "Invalid tag \"/loss\": starts with the separator"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EventLogError = io_err.into();
        assert!(matches!(err, EventLogError::Io(_)));
    }

    #[test]
    fn test_error_from_encode() {
        let err: EventLogError = EncodeError::InvalidImage("5 channels".to_string()).into();
        assert_eq!(format!("{}", err), "Encoding error: Invalid image: 5 channels");
    }
}
