use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use blobmeter_common::Counter;
use blobmeter_core::{CounterDirectory, InMemoryCounterDirectory, MetricsError, MetricsResult};

/// Directory that rejects every registration whose name contains a marker.
///
/// Exercises the fail-open paths: trackers must keep working and must not
/// try to remove names they never owned.
#[derive(Debug, Default)]
pub struct RejectingDirectory {
    inner: InMemoryCounterDirectory,
    marker: String,
    rejected: AtomicUsize,
}

impl RejectingDirectory {
    pub fn new(marker: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { marker: marker.into(), ..Self::default() })
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl CounterDirectory for RejectingDirectory {
    fn register(&self, name: &str, counter: Arc<dyn Counter>) -> MetricsResult<()> {
        if name.contains(&self.marker) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(MetricsError::Directory {
                name: name.to_string(),
                reason: "rejected by test directory".into(),
            });
        }
        self.inner.register(name, counter)
    }

    fn remove(&self, name: &str) -> bool {
        self.inner.remove(name)
    }

    fn read(&self, name: &str) -> Option<i64> {
        self.inner.read(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }
}
