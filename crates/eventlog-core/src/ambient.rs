//! Free functions logging to the calling thread's default logger.
//!
//! Each call resolves [`current`] once and forwards to it, so with no active
//! logger everything is validated and discarded.
//!
//! ```ignore
//! let logger = EventLogger::new("runs/exp1")?;
//! let _active = logger.activate();
//! let _scope = eventlog_core::tag_scope(&["train"])?;
//! eventlog_core::log_scalar("loss", 0.25, None)?; // "train/loss"
//! eventlog_core::advance_step();
//! ```

use eventlog_proto::{
    AudioInput, HistogramInput, ImageInput, LogLevel, Metadata, Payload, SessionStatus,
    TensorInput,
};

use crate::error::EventLogResult;
use crate::registry::current;
use crate::scope::TagScope;

pub fn log(tag: &str, payload: Payload, metadata: Option<Metadata>) -> EventLogResult<()> {
    current().log(tag, payload, metadata)
}

pub fn log_scalar(tag: &str, value: f64, metadata: Option<Metadata>) -> EventLogResult<()> {
    current().log_scalar(tag, value, metadata)
}

pub fn log_image(
    tag: &str,
    image: impl Into<ImageInput>,
    metadata: Option<Metadata>,
) -> EventLogResult<()> {
    current().log(tag, Payload::Image(image.into()), metadata)
}

pub fn log_audio(tag: &str, audio: AudioInput, metadata: Option<Metadata>) -> EventLogResult<()> {
    current().log_audio(tag, audio, metadata)
}

pub fn log_text(tag: &str, text: &str, metadata: Option<Metadata>) -> EventLogResult<()> {
    current().log_text(tag, text, metadata)
}

pub fn log_tensor(
    tag: &str,
    tensor: impl Into<TensorInput>,
    metadata: Option<Metadata>,
) -> EventLogResult<()> {
    current().log(tag, Payload::Tensor(tensor.into()), metadata)
}

pub fn log_histogram(
    tag: &str,
    histogram: HistogramInput,
    metadata: Option<Metadata>,
) -> EventLogResult<()> {
    current().log_histogram(tag, histogram, metadata)
}

pub fn log_message(message: &str, level: LogLevel) -> EventLogResult<()> {
    current().log_message(message, level)
}

pub fn log_session(
    status: SessionStatus,
    message: Option<&str>,
    checkpoint_path: Option<&str>,
) -> EventLogResult<()> {
    current().log_session(status, message, checkpoint_path)
}

pub fn advance_step() {
    current().advance_step();
}

pub fn set_step(step: i64) -> EventLogResult<()> {
    current().set_step(step)
}

pub fn flush() -> EventLogResult<()> {
    current().flush()
}

/// Enter tag scopes on the calling thread. The scopes apply to every logger,
/// not just the current default.
pub fn tag_scope(names: &[&str]) -> EventLogResult<TagScope> {
    TagScope::enter(names.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventLogError;

    #[test]
    fn test_without_active_logger_validates_only() {
        assert!(log_scalar("loss", 1.0, None).is_ok());
        assert!(log_text("notes", "hello", None).is_ok());
        assert!(matches!(
            log_scalar("", 1.0, None),
            Err(EventLogError::InvalidTag { .. })
        ));
        advance_step();
        set_step(3).unwrap();
        flush().unwrap();
        assert_eq!(current().current_step(), 0);
    }

    #[test]
    fn test_tag_scope_rejects_bad_names() {
        assert!(matches!(
            tag_scope(&["a/b"]),
            Err(EventLogError::InvalidScopeName(_))
        ));
    }
}
