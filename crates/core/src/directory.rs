//! Counter directory port
//!
//! The engine publishes every counter under a dotted name so an external
//! reader can query it. It only needs register, remove and read-by-name;
//! how the directory exports values is outside the engine.

use std::fmt;
use std::sync::Arc;

use blobmeter_common::Counter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{MetricsError, MetricsResult};

/// Port trait for the named-counter store
///
/// Implementations must be thread-safe; trackers on many threads register
/// and remove entries concurrently.
pub trait CounterDirectory: Send + Sync + fmt::Debug {
    /// Publish `counter` under `name`.
    ///
    /// A name that is already taken keeps its existing counter and returns
    /// [`MetricsError::DuplicateCounter`]. Callers log and carry on.
    fn register(&self, name: &str, counter: Arc<dyn Counter>) -> MetricsResult<()>;

    /// Remove `name`. Returns `false` when nothing was registered under it.
    fn remove(&self, name: &str) -> bool;

    /// Current value of `name`, `None` when unregistered.
    fn read(&self, name: &str) -> Option<i64>;

    fn contains(&self, name: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered name, sorted.
    fn names(&self) -> Vec<String>;

    /// Registered names starting with `prefix`, sorted.
    fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.names().into_iter().filter(|name| name.starts_with(prefix)).collect()
    }
}

/// Process-local directory backed by a sharded concurrent map.
#[derive(Default)]
pub struct InMemoryCounterDirectory {
    entries: DashMap<String, Arc<dyn Counter>>,
}

impl InMemoryCounterDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemoryCounterDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCounterDirectory").field("len", &self.entries.len()).finish()
    }
}

impl CounterDirectory for InMemoryCounterDirectory {
    fn register(&self, name: &str, counter: Arc<dyn Counter>) -> MetricsResult<()> {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(MetricsError::DuplicateCounter { name: name.to_string() }),
            Entry::Vacant(slot) => {
                slot.insert(counter);
                Ok(())
            }
        }
    }

    fn remove(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    fn read(&self, name: &str) -> Option<i64> {
        // Clone the handle so the shard lock is not held while the counter
        // computes its value.
        let counter = self.entries.get(name).map(|entry| Arc::clone(entry.value()))?;
        Some(counter.value())
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}
