//! The logger capability shared by real and no-op recorders.

use eventlog_proto::{
    AudioInput, HistogramInput, ImageInput, LogLevel, Metadata, Payload, SessionStatus,
    TensorInput,
};

use crate::error::EventLogResult;
use crate::scope::{self, TagScope};

/// Record observations under hierarchical tags, batched per step.
///
/// Implemented by [`EventLogger`](crate::EventLogger), which writes an event
/// file, and [`NullLogger`], which accepts and discards everything. Both
/// validate tags and encode payloads the same way, so code that runs against
/// one runs against the other.
///
/// Tags are resolved against the calling thread's tag scopes (see
/// [`tag_scope`](Logger::tag_scope)) before they are stored.
pub trait Logger: Send + Sync {
    /// Record `payload` under `tag` for the current step.
    ///
    /// Invalid tags and payloads that cannot be encoded fail without touching
    /// the logger's state.
    fn log(&self, tag: &str, payload: Payload, metadata: Option<Metadata>) -> EventLogResult<()>;

    /// Write a free-text message record and flush to disk immediately.
    fn log_message(&self, message: &str, level: LogLevel) -> EventLogResult<()>;

    /// Write a session status record and flush to disk immediately.
    fn log_session(
        &self,
        status: SessionStatus,
        message: Option<&str>,
        checkpoint_path: Option<&str>,
    ) -> EventLogResult<()>;

    /// Commit the pending values under the current step, then increment it.
    fn advance_step(&self);

    /// Flush everything pending, then set the step to `step`.
    fn set_step(&self, step: i64) -> EventLogResult<()>;

    /// Commit the pending values and write the buffer to disk.
    fn flush(&self) -> EventLogResult<()>;

    fn current_step(&self) -> i64;

    /// Enter tag scopes on the calling thread until the guard is dropped.
    fn tag_scope(&self, names: &[&str]) -> EventLogResult<TagScope> {
        TagScope::enter(names.iter().copied())
    }

    /// Resolve `tag` against the calling thread's tag scopes.
    fn full_tag(&self, tag: &str) -> EventLogResult<String> {
        scope::full_tag(tag)
    }

    fn log_scalar(
        &self,
        tag: &str,
        value: f64,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()> {
        self.log(tag, Payload::Scalar(value), metadata)
    }

    fn log_image(
        &self,
        tag: &str,
        image: impl Into<ImageInput>,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()>
    where
        Self: Sized,
    {
        self.log(tag, Payload::Image(image.into()), metadata)
    }

    fn log_audio(
        &self,
        tag: &str,
        audio: AudioInput,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()> {
        self.log(tag, Payload::Audio(audio), metadata)
    }

    fn log_text(&self, tag: &str, text: &str, metadata: Option<Metadata>) -> EventLogResult<()> {
        self.log(tag, Payload::Text(text.to_string()), metadata)
    }

    fn log_tensor(
        &self,
        tag: &str,
        tensor: impl Into<TensorInput>,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()>
    where
        Self: Sized,
    {
        self.log(tag, Payload::Tensor(tensor.into()), metadata)
    }

    fn log_histogram(
        &self,
        tag: &str,
        histogram: HistogramInput,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()> {
        self.log(tag, Payload::Histogram(histogram), metadata)
    }
}

/// Logger that records nothing.
///
/// Tags are still resolved and payloads still encoded, so callers see the
/// same errors they would with a real logger. No file is created and no
/// thread is started.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(
        &self,
        tag: &str,
        payload: Payload,
        metadata: Option<Metadata>,
    ) -> EventLogResult<()> {
        payload.into_value(scope::full_tag(tag)?, metadata)?;
        Ok(())
    }

    fn log_message(&self, _message: &str, _level: LogLevel) -> EventLogResult<()> {
        Ok(())
    }

    fn log_session(
        &self,
        _status: SessionStatus,
        _message: Option<&str>,
        _checkpoint_path: Option<&str>,
    ) -> EventLogResult<()> {
        Ok(())
    }

    fn advance_step(&self) {}

    fn set_step(&self, _step: i64) -> EventLogResult<()> {
        Ok(())
    }

    fn flush(&self) -> EventLogResult<()> {
        Ok(())
    }

    fn current_step(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventLogError;

    #[test]
    fn test_null_logger_validates_tags() {
        let logger = NullLogger;
        assert!(logger.log_scalar("loss", 1.0, None).is_ok());
        assert!(matches!(
            logger.log_scalar("/loss", 1.0, None),
            Err(EventLogError::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_null_logger_rejects_bad_payloads() {
        let logger = NullLogger;
        let five_channels = ndarray::Array3::<u8>::zeros((5, 2, 2));
        assert!(matches!(
            logger.log_image("img", five_channels, None),
            Err(EventLogError::Encode(_))
        ));

        let ragged = AudioInput::new(vec![0i16; 5], 16_000, 2);
        assert!(matches!(
            logger.log_audio("wave", ragged, None),
            Err(EventLogError::Encode(_))
        ));
        assert!(logger
            .log_audio("wave", AudioInput::new(vec![0i16; 4], 16_000, 2), None)
            .is_ok());
    }

    #[test]
    fn test_null_logger_step_stays_zero() {
        let logger = NullLogger;
        logger.advance_step();
        logger.set_step(42).unwrap();
        assert_eq!(logger.current_step(), 0);
    }

    #[test]
    fn test_scope_through_trait_object() {
        let logger: &dyn Logger = &NullLogger;
        let _scope = logger.tag_scope(&["eval"]).unwrap();
        assert_eq!(logger.full_tag("acc").unwrap(), "eval/acc");
    }
}
