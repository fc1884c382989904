//! Per-thread default logger.
//!
//! Each thread keeps a stack of active loggers. The top of the calling
//! thread's stack is what the free functions in this crate log to; with an
//! empty stack they go to a [`NullLogger`]. Activating a logger on one thread
//! has no effect on any other thread.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::logger::{Logger, NullLogger};

thread_local! {
    static ACTIVE: RefCell<Vec<Arc<dyn Logger>>> = const { RefCell::new(Vec::new()) };
}

/// Guard keeping a logger active on the current thread. Dropping it pops the
/// logger and anything activated after it.
#[must_use = "the logger is deactivated as soon as the guard is dropped"]
pub struct ActiveLogger {
    base: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ActiveLogger {
    fn drop(&mut self) {
        let _ = ACTIVE.try_with(|stack| stack.borrow_mut().truncate(self.base));
    }
}

/// Push `logger` as the calling thread's default.
pub fn activate(logger: Arc<dyn Logger>) -> ActiveLogger {
    let base = ACTIVE.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(logger);
        stack.len() - 1
    });
    ActiveLogger {
        base,
        _not_send: PhantomData,
    }
}

/// The calling thread's default logger.
pub fn current() -> Arc<dyn Logger> {
    ACTIVE
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| Arc::new(NullLogger))
}

/// Depth of the calling thread's logger stack.
pub fn depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}
