//! Per-thread tag scopes.
//!
//! Every thread owns a stack of scope names. Entering a scope pushes names,
//! dropping the returned [`TagScope`] pops them again, including when the
//! scope body returns early or unwinds. Tags are resolved against the stack
//! of the calling thread only:
//!
//! ```ignore
//! let _outer = TagScope::enter(["train"])?;
//! {
//!     let _inner = TagScope::enter(["layer1"])?;
//!     assert_eq!(full_tag("weights")?, "train/layer1/weights");
//! }
//! assert_eq!(full_tag("loss")?, "train/loss");
//! ```
//!
//! The stack is shared by every logger used on the thread, so scopes entered
//! through one logger (or the free functions) apply to all of them.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::error::{EventLogError, EventLogResult};

/// Hierarchical tag separator.
pub const SEPARATOR: char = '/';

thread_local! {
    static SCOPE_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Guard for an entered tag scope. Not `Send`: it must be dropped on the
/// thread whose stack it pushed to.
#[must_use = "the scope is exited as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TagScope {
    base: usize,
    _not_send: PhantomData<*const ()>,
}

impl TagScope {
    /// Validate every name, then push them in order.
    ///
    /// Nothing is pushed if any name is invalid.
    pub fn enter<I, S>(names: I) -> EventLogResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(bad) = names
            .iter()
            .find(|name| name.is_empty() || name.contains(SEPARATOR))
        {
            return Err(EventLogError::InvalidScopeName(bad.clone()));
        }

        let base = SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let base = stack.len();
            stack.extend(names);
            base
        });
        Ok(Self {
            base,
            _not_send: PhantomData,
        })
    }
}

impl Drop for TagScope {
    fn drop(&mut self) {
        let _ = SCOPE_STACK.try_with(|stack| stack.borrow_mut().truncate(self.base));
    }
}

/// The calling thread's scope names, outermost first.
pub fn current_scope() -> Vec<String> {
    SCOPE_STACK.with(|stack| stack.borrow().clone())
}

/// Compute the fully-qualified tag for `tag` under the calling thread's
/// scopes. Runs of separators collapse to one.
pub fn full_tag(tag: &str) -> EventLogResult<String> {
    if tag.is_empty() {
        return Err(EventLogError::InvalidTag {
            tag: tag.to_string(),
            reason: "empty",
        });
    }
    if tag.starts_with(SEPARATOR) {
        return Err(EventLogError::InvalidTag {
            tag: tag.to_string(),
            reason: "starts with the separator",
        });
    }

    let leaf = collapse_separators(tag);
    Ok(SCOPE_STACK.with(|stack| {
        let stack = stack.borrow();
        if stack.is_empty() {
            return leaf;
        }
        let mut full = stack.join("/");
        full.push(SEPARATOR);
        full.push_str(&leaf);
        full
    }))
}

fn collapse_separators(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut after_separator = false;
    for c in tag.chars() {
        if c == SEPARATOR {
            if after_separator {
                continue;
            }
            after_separator = true;
        } else {
            after_separator = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nested_scopes() {
        let outer = TagScope::enter(["a", "b"]).unwrap();
        assert_eq!(full_tag("x").unwrap(), "a/b/x");
        {
            let _inner = TagScope::enter(["c"]).unwrap();
            assert_eq!(full_tag("x").unwrap(), "a/b/c/x");
        }
        assert_eq!(full_tag("x").unwrap(), "a/b/x");
        drop(outer);
        assert_eq!(full_tag("x").unwrap(), "x");
    }

    #[test]
    fn test_collapses_repeated_separators() {
        assert_eq!(full_tag("a//b").unwrap(), "a/b");
        assert_eq!(full_tag("a///b//c").unwrap(), "a/b/c");
    }

    #[test]
    fn test_rejects_leading_separator_and_empty() {
        assert!(matches!(
            full_tag("/a"),
            Err(EventLogError::InvalidTag { .. })
        ));
        assert!(matches!(full_tag(""), Err(EventLogError::InvalidTag { .. })));
    }

    #[test]
    fn test_invalid_scope_names_push_nothing() {
        for bad in [vec!["ok", ""], vec!["ok", "a/b"]] {
            let err = TagScope::enter(bad).unwrap_err();
            assert!(matches!(err, EventLogError::InvalidScopeName(_)));
            assert!(current_scope().is_empty());
        }
    }

    #[test]
    fn test_scope_popped_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _scope = TagScope::enter(["doomed"]).unwrap();
            panic!("scope body failed");
        });
        assert!(result.is_err());
        assert!(current_scope().is_empty());
    }

    #[test]
    fn test_scopes_are_per_thread() {
        let _scope = TagScope::enter(["main"]).unwrap();
        let other = std::thread::spawn(|| full_tag("x").unwrap())
            .join()
            .unwrap();
        assert_eq!(other, "x");
        assert_eq!(full_tag("x").unwrap(), "main/x");
    }

    fn scope_name() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.-]{1,12}"
    }

    proptest! {
        /// Any valid scope path is prefixed onto the tag and removed on exit
        #[test]
        fn scope_prefix_roundtrip(names in prop::collection::vec(scope_name(), 1..5), leaf in scope_name()) {
            {
                let _scope = TagScope::enter(names.clone()).unwrap();
                let expected = format!("{}/{}", names.join("/"), leaf);
                prop_assert_eq!(full_tag(&leaf).unwrap(), expected);
            }
            prop_assert_eq!(full_tag(&leaf).unwrap(), leaf);
        }

        /// Resolved tags never contain an empty path segment
        #[test]
        fn resolved_tags_have_no_empty_segments(tag in "[a-z]{1,4}(/{1,3}[a-z]{1,4}){0,4}") {
            let full = full_tag(&tag).unwrap();
            prop_assert!(!full.contains("//"));
            prop_assert!(!full.starts_with('/'));
        }
    }
}
