//! Record model and serialization for eventlog.
//!
//! This crate is the boundary the recorder hands work to. It knows how to:
//!
//! - describe records (header, summary, log message, session log) as
//!   protobuf messages ([`schema`])
//! - frame an encoded record so it can be appended verbatim to a file
//!   ([`record`])
//! - transcode pixel arrays to PNG and waveforms to 16-bit WAV ([`media`])
//! - build tensor and histogram values ([`tensor`], [`histogram`])
//!
//! It does not know about steps, batching, buffering or files. See
//! `eventlog-core` for that.
//!
//! ```ignore
//! use eventlog_proto::{Event, Payload};
//!
//! let value = Payload::Scalar(0.5).into_value("loss".into(), None)?;
//! let bytes = Event::summary(0, vec![value]).to_record_bytes();
//! ```

pub mod error;
pub mod histogram;
pub mod media;
pub mod record;
pub mod schema;
pub mod tensor;
pub mod value;

pub use error::{EncodeError, EncodeResult};
pub use histogram::{Bins, HistogramInput};
pub use media::{AudioInput, AudioSamples, ColorSpace, ImageInput};
pub use record::{encode_record, encode_record_into, masked_crc32c};
pub use schema::{Event, LogLevel, SessionStatus, Summary, Value};
pub use tensor::{TensorData, TensorInput};
pub use value::{Metadata, Payload};
