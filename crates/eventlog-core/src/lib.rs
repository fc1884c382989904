//! Eventlog Core Library
//!
//! Concurrent, buffered, step-batched recording of training and telemetry
//! observations into append-only event files.
//!
//! ## Overview
//!
//! Producers on any thread record scalars, images, audio, text, tensors and
//! histograms under hierarchical tags. Values recorded during one step are
//! bundled into a single summary record; free-text messages and session
//! status changes get records of their own and are written to disk at once.
//!
//! - **Tag scopes**: per-thread `/`-separated prefixes, see [`TagScope`]
//! - **Batching**: at most one pending value per tag; recording a tag twice
//!   in a step commits the first value before storing the second
//! - **Flushing**: on demand, on step jumps, on message and session records,
//!   and periodically on a background thread
//! - **Default logger**: a per-thread stack behind the free functions
//!
//! ## Quick Start
//!
//! ```ignore
//! use eventlog_core::{EventLogger, Logger};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logger = EventLogger::new("runs/exp1")?;
//!
//!     for epoch in 0..10 {
//!         let _scope = logger.tag_scope(&["train"])?;
//!         logger.log_scalar("loss", 1.0 / (epoch + 1) as f64, None)?;
//!         logger.advance_step();
//!     }
//!
//!     logger.close()?;
//!     Ok(())
//! }
//! ```

mod ambient;
mod batch;
pub mod config;
pub mod error;
pub mod event_logger;
pub mod logger;
pub mod registry;
mod scheduler;
pub mod scope;
mod state;

// Re-exports
pub use ambient::{
    advance_step, flush, log, log_audio, log_histogram, log_image, log_message, log_scalar,
    log_session, log_tensor, log_text, set_step, tag_scope,
};
pub use config::{EventLoggerConfig, DEFAULT_FLUSH_INTERVAL};
pub use error::{EventLogError, EventLogResult};
pub use event_logger::{EventLogger, RESTART_MESSAGE};
pub use logger::{Logger, NullLogger};
pub use registry::{current, ActiveLogger};
pub use scope::{full_tag, TagScope};

pub use eventlog_proto as proto;
pub use eventlog_proto::{
    AudioInput, AudioSamples, Bins, ColorSpace, HistogramInput, ImageInput, LogLevel, Metadata,
    Payload, SessionStatus, TensorData, TensorInput,
};
