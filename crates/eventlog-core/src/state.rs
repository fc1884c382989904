//! Mutable recorder state: step counter, value batch, byte buffer.
//!
//! Everything here runs under the owning logger's reentrant lock. Nothing in
//! this module locks on its own, and nothing here emits `tracing` events:
//! they are queued as [`Notice`]s and emitted by the owner once the state is
//! no longer borrowed, so a subscriber may call back into the same logger.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::BytesMut;
use eventlog_proto::{encode_record_into, Event, Value};
use tracing::{debug, error, trace, warn};

use crate::batch::ValueBatch;
use crate::scheduler::FlushSchedule;

/// A diagnostic raised while the state was borrowed.
#[derive(Debug)]
pub(crate) enum Notice {
    Committed { step: i64, values: usize },
    Flushed { bytes: usize },
    SchedulerStarted { interval: Duration },
    SchedulerFailed { error: io::Error },
    TruncateFailed { error: io::Error },
}

impl Notice {
    pub fn emit(&self, path: &Path) {
        match self {
            Self::Committed { step, values } => {
                trace!(step, values, "committed summary");
            }
            Self::Flushed { bytes } => {
                debug!(path = %path.display(), bytes, "flushed event file");
            }
            Self::SchedulerStarted { interval } => {
                debug!(?interval, "flush scheduler started");
            }
            Self::SchedulerFailed { error } => {
                error!(error = %error, "failed to spawn flush scheduler, periodic flushing disabled");
            }
            Self::TruncateFailed { error } => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "could not remove partial write from event file"
                );
            }
        }
    }
}

/// Where flushed bytes go. Implemented for [`File`]; tests substitute sinks
/// that fail on demand.
pub(crate) trait EventSink: Write {
    /// Current length, taken before each write.
    fn position(&mut self) -> io::Result<u64>;
    /// Drop everything past `len`.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl EventSink for File {
    fn position(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

pub(crate) struct LoggerState {
    path: PathBuf,
    step: i64,
    batch: ValueBatch,
    buffer: BytesMut,
    notices: Vec<Notice>,
    pub exiting: bool,
    pub schedule: FlushSchedule,
}

impl LoggerState {
    pub fn new(path: PathBuf, step: i64, schedule: FlushSchedule) -> Self {
        Self {
            path,
            step,
            batch: ValueBatch::new(),
            buffer: BytesMut::new(),
            notices: Vec::new(),
            exiting: false,
            schedule,
        }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Diagnostics raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        mem::take(&mut self.notices)
    }

    /// Store a value for the current step. A value already pending under the
    /// same tag is committed first, together with the rest of the batch.
    pub fn record(&mut self, value: Value) {
        if self.batch.contains(&value.tag) {
            self.commit_batch();
        }
        self.batch.insert(value);
    }

    /// Move every pending value into one summary record at the current step.
    pub fn commit_batch(&mut self) {
        if let Some(values) = self.batch.drain() {
            self.notices.push(Notice::Committed {
                step: self.step,
                values: values.len(),
            });
            self.append(&Event::summary(self.step, values));
        }
    }

    /// Frame `event` onto the buffer and make sure periodic flushing runs,
    /// unless the logger is shutting down.
    pub fn append(&mut self, event: &Event) {
        self.buffer_record(event);
        if self.exiting {
            return;
        }
        match self.schedule.ensure_started() {
            Some(Ok(interval)) => self.notices.push(Notice::SchedulerStarted { interval }),
            Some(Err(error)) => self.notices.push(Notice::SchedulerFailed { error }),
            None => {}
        }
    }

    /// Frame `event` onto the buffer without touching the schedule. Used for
    /// the records written while the logger is still being built.
    pub fn buffer_record(&mut self, event: &Event) {
        encode_record_into(event, &mut self.buffer);
    }

    /// Commit the batch, then write the whole buffer to the event file and
    /// sync it. Returns the number of bytes written.
    ///
    /// Bytes are written at most once. If the file cannot be opened or the
    /// write fails, the file is cut back to its previous length and the
    /// buffer is kept for the next flush. Once the write succeeds the buffer
    /// is cleared, so a failed sync is reported but never rewritten.
    pub fn flush(&mut self) -> io::Result<usize> {
        self.commit_batch();
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.write_to(&mut file)
    }

    fn write_to(&mut self, sink: &mut impl EventSink) -> io::Result<usize> {
        let start = sink.position()?;
        if let Err(e) = sink.write_all(&self.buffer) {
            if let Err(error) = sink.truncate(start) {
                self.notices.push(Notice::TruncateFailed { error });
            }
            return Err(e);
        }

        let written = self.buffer.len();
        self.buffer.clear();
        sink.sync()?;
        self.notices.push(Notice::Flushed { bytes: written });
        Ok(written)
    }

    /// Stop periodic flushing for good, then write what is left. Stopping
    /// first keeps the final flush from starting a new flush thread. Returns
    /// the flush result and the thread to join, if one was running.
    pub fn shutdown(&mut self) -> (io::Result<usize>, Option<JoinHandle<()>>) {
        self.exiting = true;
        let thread = self.schedule.stop();
        (self.flush(), thread)
    }

    pub fn advance(&mut self) {
        self.commit_batch();
        self.step += 1;
    }

    /// Flush everything under the old step, then jump to `step`. The step is
    /// left unchanged if the flush fails.
    pub fn set_step(&mut self, step: i64) -> io::Result<()> {
        self.flush()?;
        self.step = step;
        Ok(())
    }

    /// Commit the batch, append the record built for the current step, and
    /// flush to disk immediately.
    pub fn log_special(&mut self, make_event: impl FnOnce(i64) -> Event) -> io::Result<()> {
        self.commit_batch();
        let event = make_event(self.step);
        self.append(&event);
        self.flush().map(|_| ())
    }

    #[cfg(test)]
    pub fn pending_values(&self) -> usize {
        self.batch.len()
    }
}
