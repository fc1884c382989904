//! The file-backed logger.
//!
//! An [`EventLogger`] owns exactly one event file, named once at construction
//! and never reopened by anyone else. Producers on any thread record values;
//! values are batched per step and framed into an in-memory buffer; the
//! buffer reaches disk on explicit flushes, step jumps, message and session
//! records, and on the background schedule when one is configured.
//!
//! All state sits behind one reentrant lock, so a thread may call back into
//! the logger while already holding it (see [`EventLogger::atomically`]).
//! Diagnostics raised under the lock are emitted only after the state is
//! released, so a `tracing` subscriber may itself log through the same
//! logger.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use chrono::{DateTime, Utc};
use eventlog_proto::{Event, LogLevel, Metadata, Payload, SessionStatus};
use parking_lot::ReentrantMutex;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::config::EventLoggerConfig;
use crate::error::{EventLogError, EventLogResult};
use crate::logger::Logger;
use crate::registry::{self, ActiveLogger};
use crate::scheduler::{FlushSchedule, PeriodicFlush};
use crate::scope;
use crate::state::LoggerState;

/// Session log message written when a logger resumes from a saved step.
pub const RESTART_MESSAGE: &str = "Restarting...";

/// Recorder writing one append-only event file.
///
/// Cheap to clone; clones share the same file, buffer and step. The last
/// clone to go away flushes whatever is still buffered, but that flush is
/// best effort: call [`close`](Self::close) for a deterministic final write.
///
/// ```ignore
/// let logger = EventLogger::builder(dir).no_background_flush().build()?;
/// logger.log_scalar("loss", 0.5, None)?;
/// logger.advance_step();
/// logger.close()?;
/// ```
#[derive(Clone)]
pub struct EventLogger {
    shared: Arc<Shared>,
}

struct Shared {
    log_dir: PathBuf,
    path: PathBuf,
    creation_step: Option<i64>,
    state: ReentrantMutex<RefCell<LoggerState>>,
    background_failures: AtomicU64,
}

impl Shared {
    /// Run `f` on the locked state, then emit what it raised once the
    /// borrow is released. The lock itself is still held while emitting.
    fn with_state<R>(&self, f: impl FnOnce(&mut LoggerState) -> R) -> R {
        let guard = self.state.lock();
        let (result, notices) = {
            let mut state = guard.borrow_mut();
            let result = f(&mut state);
            (result, state.take_notices())
        };
        for notice in &notices {
            notice.emit(&self.path);
        }
        result
    }
}

impl PeriodicFlush for Shared {
    fn periodic_flush(&self) -> bool {
        let (result, exiting) = self.with_state(|state| (state.flush(), state.exiting));
        if let Err(e) = result {
            self.background_failures.fetch_add(1, Ordering::Relaxed);
            warn!(path = %self.path.display(), error = %e, "background flush failed");
        }
        exiting
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().get_mut();
        // Not joined: the thread may be the one running this drop.
        let (result, thread) = state.shutdown();
        drop(thread);
        for notice in state.take_notices() {
            notice.emit(&self.path);
        }
        if let Err(e) = result {
            warn!(
                path = %self.path.display(),
                error = %e,
                bytes = state.pending_bytes(),
                "final flush on drop failed, buffered records lost"
            );
        }
    }
}

impl EventLogger {
    /// Open a logger in `log_dir` with the default settings.
    pub fn new(log_dir: impl Into<PathBuf>) -> EventLogResult<Self> {
        Self::from_config(EventLoggerConfig::new(log_dir))
    }

    pub fn builder(log_dir: impl Into<PathBuf>) -> EventLoggerConfig {
        EventLoggerConfig::new(log_dir)
    }

    /// Open a logger.
    ///
    /// The directory must already exist and the computed file name must be
    /// free. The header record, plus a restart marker when resuming from a
    /// nonzero step, is buffered right away; the file itself is created by
    /// the first flush.
    pub fn from_config(config: EventLoggerConfig) -> EventLogResult<Self> {
        let file_name = event_file_name(Utc::now(), Ulid::new());
        Self::open(config, &file_name)
    }

    fn open(config: EventLoggerConfig, file_name: &str) -> EventLogResult<Self> {
        let EventLoggerConfig {
            log_dir,
            start_step,
            flush_interval,
        } = config;

        if flush_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(EventLogError::InvalidConfig(
                "flush interval must be greater than zero".to_string(),
            ));
        }
        if !log_dir.is_dir() {
            return Err(EventLogError::MissingDirectory(log_dir));
        }
        let path = log_dir.join(file_name);
        if path.exists() {
            return Err(EventLogError::FileExists(path));
        }

        let step = start_step.unwrap_or(0);
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let target: Weak<dyn PeriodicFlush> = weak.clone();
            let mut state =
                LoggerState::new(path.clone(), step, FlushSchedule::new(flush_interval, target));
            state.buffer_record(&Event::header(step));
            if start_step.is_some_and(|k| k != 0) {
                state.buffer_record(&Event::session_log(
                    step,
                    SessionStatus::Start,
                    Some(RESTART_MESSAGE),
                    Some(log_dir.to_string_lossy().as_ref()),
                ));
            }
            Shared {
                log_dir,
                path,
                creation_step: start_step,
                state: ReentrantMutex::new(RefCell::new(state)),
                background_failures: AtomicU64::new(0),
            }
        });

        debug!(
            path = %shared.path.display(),
            step,
            flush_interval = ?flush_interval,
            "event logger created"
        );
        Ok(Self { shared })
    }

    /// Path of the event file. It does not exist before the first flush.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn log_dir(&self) -> &Path {
        &self.shared.log_dir
    }

    /// Step the logger was opened at, if one was given.
    pub fn creation_step(&self) -> Option<i64> {
        self.shared.creation_step
    }

    /// Bytes framed but not yet written to the file.
    pub fn pending_bytes(&self) -> usize {
        self.shared.with_state(|state| state.pending_bytes())
    }

    /// Number of background flushes that failed so far.
    pub fn background_failures(&self) -> u64 {
        self.shared.background_failures.load(Ordering::Relaxed)
    }

    pub fn background_flush_running(&self) -> bool {
        self.shared.with_state(|state| state.schedule.is_running())
    }

    /// Run `f` while holding the logger's lock, so no other thread's calls
    /// interleave with the calls `f` makes. The lock is reentrant; calling
    /// back into the logger from `f` is fine.
    pub fn atomically<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.shared.state.lock();
        f(self)
    }

    /// Make this logger the calling thread's default until the guard drops.
    pub fn activate(&self) -> ActiveLogger {
        registry::activate(Arc::new(self.clone()))
    }

    /// Flush everything, stop the background schedule and wait for its
    /// thread to finish.
    ///
    /// Later calls still buffer records, but nothing reaches the file until
    /// an explicit flush. The wait is skipped when called from the flush
    /// thread itself or while holding the lock through
    /// [`atomically`](Self::atomically).
    pub fn close(&self) -> EventLogResult<()> {
        let (result, thread) = self.shared.with_state(|state| state.shutdown());

        if let Some(thread) = thread {
            let joinable = thread.thread().id() != thread::current().id()
                && !self.shared.state.is_owned_by_current_thread();
            if joinable && thread.join().is_err() {
                warn!(path = %self.path().display(), "flush scheduler panicked");
            }
        }
        result?;
        Ok(())
    }
}

impl Logger for EventLogger {
    fn log(&self, tag: &str, payload: Payload, metadata: Option<Metadata>) -> EventLogResult<()> {
        let tag = scope::full_tag(tag)?;
        // Encode before locking: media transcoding is the slow part.
        let value = payload.into_value(tag, metadata)?;
        self.shared.with_state(|state| state.record(value));
        Ok(())
    }

    fn log_message(&self, message: &str, level: LogLevel) -> EventLogResult<()> {
        self.shared
            .with_state(|state| state.log_special(|step| Event::log_message(step, level, message)))?;
        Ok(())
    }

    fn log_session(
        &self,
        status: SessionStatus,
        message: Option<&str>,
        checkpoint_path: Option<&str>,
    ) -> EventLogResult<()> {
        self.shared.with_state(|state| {
            state.log_special(|step| Event::session_log(step, status, message, checkpoint_path))
        })?;
        Ok(())
    }

    fn advance_step(&self) {
        self.shared.with_state(|state| state.advance());
    }

    fn set_step(&self, step: i64) -> EventLogResult<()> {
        self.shared.with_state(|state| state.set_step(step))?;
        Ok(())
    }

    fn flush(&self) -> EventLogResult<()> {
        self.shared.with_state(|state| state.flush())?;
        Ok(())
    }

    fn current_step(&self) -> i64 {
        self.shared.with_state(|state| state.step())
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("path", &self.shared.path)
            .field("creation_step", &self.shared.creation_step)
            .finish_non_exhaustive()
    }
}

/// `tfevents.<seconds:020>.<nanos:09>.<ulid>.out`.
///
/// The timestamp part is always 30 characters, so names sort chronologically
/// as plain text.
fn event_file_name(now: DateTime<Utc>, id: Ulid) -> String {
    format!(
        "tfevents.{:020}.{:09}.{}.out",
        now.timestamp(),
        now.timestamp_subsec_nanos(),
        id
    )
}
