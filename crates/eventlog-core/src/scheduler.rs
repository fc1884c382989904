//! Background periodic flush.
//!
//! One thread per logger, started lazily the first time the logger's buffer
//! grows. The thread only holds a weak reference to its logger, so it never
//! keeps a dropped logger alive, and it waits on a cancellation channel so
//! stopping the schedule wakes it immediately instead of after a full
//! interval.

use std::io;
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::debug;

/// Something the scheduler can flush on each tick.
pub(crate) trait PeriodicFlush: Send + Sync + 'static {
    /// Flush once, absorbing any failure. Returns `true` once the owner is
    /// exiting and no further ticks are wanted.
    fn periodic_flush(&self) -> bool;
}

/// Lifecycle of a logger's background flush thread.
pub(crate) enum FlushSchedule {
    /// Periodic flushing was not requested
    Disabled,
    /// Requested but not started yet
    Idle {
        interval: Duration,
        target: Weak<dyn PeriodicFlush>,
    },
    Running(SchedulerHandle),
    /// Stopped for good; never restarted
    Stopped,
}

pub(crate) struct SchedulerHandle {
    // Dropping the sender disconnects the channel, which is the stop signal.
    _cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl FlushSchedule {
    pub fn new(interval: Option<Duration>, target: Weak<dyn PeriodicFlush>) -> Self {
        match interval {
            Some(interval) => Self::Idle { interval, target },
            None => Self::Disabled,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Start the thread if it was requested and has not started yet.
    ///
    /// Returns `None` when nothing was attempted, otherwise the interval the
    /// thread ticks at or the spawn error. A failed spawn disables periodic
    /// flushing; explicit flushes keep working. Nothing is logged here: the
    /// caller may still hold the logger's state borrowed.
    pub fn ensure_started(&mut self) -> Option<io::Result<Duration>> {
        let Self::Idle { interval, target } = self else {
            return None;
        };
        let interval = *interval;
        let target = target.clone();
        let (cancel, cancelled) = crossbeam_channel::bounded::<()>(1);

        let spawned = thread::Builder::new()
            .name("eventlog-flush".into())
            .spawn(move || run(target, interval, cancelled));

        match spawned {
            Ok(thread) => {
                *self = Self::Running(SchedulerHandle {
                    _cancel: cancel,
                    thread,
                });
                Some(Ok(interval))
            }
            Err(e) => {
                *self = Self::Disabled;
                Some(Err(e))
            }
        }
    }

    /// Stop for good. Returns the thread handle so the caller can join it
    /// once no lock the thread might wait on is held.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        match std::mem::replace(self, Self::Stopped) {
            Self::Running(handle) => Some(handle.thread),
            _ => None,
        }
    }
}

fn run(target: Weak<dyn PeriodicFlush>, interval: Duration, cancelled: Receiver<()>) {
    loop {
        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(target) = target.upgrade() else {
            break;
        };
        if target.periodic_flush() {
            break;
        }
    }
    debug!("flush scheduler stopped");
}
