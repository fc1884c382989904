//! Pending values for the current step.

use std::collections::HashSet;

use eventlog_proto::Value;

/// Values waiting to be committed as one summary record, at most one per
/// tag, in the order they were recorded.
///
/// Also remembers every tag ever recorded: descriptive metadata is only
/// written the first time a tag appears, later values for the same tag have
/// it stripped.
#[derive(Debug, Default)]
pub(crate) struct ValueBatch {
    pending: Vec<Value>,
    pending_tags: HashSet<String>,
    seen_tags: HashSet<String>,
}

impl ValueBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.pending_tags.contains(tag)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Store `value`. The caller must have drained any pending value with
    /// the same tag first.
    pub fn insert(&mut self, mut value: Value) {
        debug_assert!(!self.contains(&value.tag), "tag already pending");
        if self.seen_tags.contains(&value.tag) {
            value.metadata = None;
        } else {
            self.seen_tags.insert(value.tag.clone());
        }
        self.pending_tags.insert(value.tag.clone());
        self.pending.push(value);
    }

    /// Take every pending value, or `None` when nothing is pending.
    pub fn drain(&mut self) -> Option<Vec<Value>> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending_tags.clear();
        Some(std::mem::take(&mut self.pending))
    }
}
