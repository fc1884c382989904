//! Error types for payload encoding

use thiserror::Error;

/// Errors raised while turning a logged payload into a summary value.
///
/// Every variant is produced before anything reaches a logger's buffer, so a
/// failed encode never leaves a partial record behind.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Pixel array or pre-encoded image description is unusable
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Sample buffer does not match the declared channel layout
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Tensor shape and dimension names disagree
    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),

    /// Histogram input or bin specification is unusable
    #[error("Invalid histogram: {0}")]
    InvalidHistogram(String),

    /// PNG transcoder failure
    #[error("PNG encoding error: {0}")]
    Png(#[from] image::ImageError),

    /// WAV transcoder failure
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}

/// Result type alias using EncodeError
pub type EncodeResult<T> = Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EncodeError::InvalidImage("5 channels".to_string());
        assert_eq!(format!("{}", err), "Invalid image: 5 channels");
    }
}
