//! Logger configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EventLogResult;
use crate::event_logger::EventLogger;

/// Interval between background flushes when none is configured.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Settings for opening an [`EventLogger`].
///
/// Serializes with the flush interval in fractional seconds; `null`
/// disables background flushing and a missing field means the default.
///
/// ```ignore
/// let logger = EventLogger::builder("runs/exp1")
///     .start_step(1000)
///     .flush_interval(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLoggerConfig {
    /// Existing directory the event file is created in
    pub log_dir: PathBuf,

    /// Step to resume from. A nonzero value also writes a restart marker.
    #[serde(default)]
    pub start_step: Option<i64>,

    /// Background flush period, `None` to flush only on demand
    #[serde(default = "default_flush_interval", with = "flush_secs")]
    pub flush_interval: Option<Duration>,
}

fn default_flush_interval() -> Option<Duration> {
    Some(DEFAULT_FLUSH_INTERVAL)
}

impl EventLoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            start_step: None,
            flush_interval: default_flush_interval(),
        }
    }

    pub fn start_step(mut self, step: i64) -> Self {
        self.start_step = Some(step);
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    /// Only flush on explicit calls, step jumps and special records.
    pub fn no_background_flush(mut self) -> Self {
        self.flush_interval = None;
        self
    }

    /// Open a logger with these settings.
    pub fn build(self) -> EventLogResult<EventLogger> {
        EventLogger::from_config(self)
    }
}

mod flush_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        interval: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        interval.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            None => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EventLoggerConfig::new("/tmp/run");
        assert_eq!(config.start_step, None);
        assert_eq!(config.flush_interval, Some(DEFAULT_FLUSH_INTERVAL));
    }

    #[test]
    fn test_json_interval_in_seconds() {
        let config = EventLoggerConfig::new("/tmp/run")
            .start_step(5)
            .flush_interval(Duration::from_millis(2500));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["flush_interval"], serde_json::json!(2.5));
        assert_eq!(json["start_step"], serde_json::json!(5));

        let back: EventLoggerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_json_null_disables_and_missing_defaults() {
        let disabled: EventLoggerConfig =
            serde_json::from_str(r#"{"log_dir": "/tmp/run", "flush_interval": null}"#).unwrap();
        assert_eq!(disabled.flush_interval, None);

        let defaulted: EventLoggerConfig =
            serde_json::from_str(r#"{"log_dir": "/tmp/run"}"#).unwrap();
        assert_eq!(defaulted.flush_interval, Some(DEFAULT_FLUSH_INTERVAL));
        assert_eq!(defaulted.start_step, None);
    }

    #[test]
    fn test_json_negative_interval_rejected() {
        let result: Result<EventLoggerConfig, _> =
            serde_json::from_str(r#"{"log_dir": "/tmp/run", "flush_interval": -1.0}"#);
        assert!(result.is_err());
    }
}
