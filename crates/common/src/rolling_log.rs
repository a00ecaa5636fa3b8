use std::collections::VecDeque;

pub const DEFAULT_LOG_CAPACITY: usize = 15;

/// Capped, most-recent-first log shown in the dashboard's text panel.
///
/// Nothing here is persisted; once an entry falls off the end it is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingLog {
    entries: VecDeque<String>,
    max_size: usize,
}

impl RollingLog {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_front(entry.into());

        // Keep only the most recent entries
        self.entries.truncate(self.max_size);
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
