//! Per-request counter registration
//!
//! A tracker publishes its transient counters once at creation and must
//! remove them exactly once at its terminal call.

use std::sync::Arc;

use blobmeter_common::{log_classified, Counter};
use tracing::warn;

use crate::directory::CounterDirectory;
use crate::naming;

/// Names a tracker published, removed on the first `deregister`.
#[derive(Debug)]
pub(crate) struct TransientCounters {
    directory: Arc<dyn CounterDirectory>,
    names: Vec<String>,
}

impl TransientCounters {
    pub(crate) fn register(
        directory: Arc<dyn CounterDirectory>,
        prefix: &str,
        entries: Vec<(&'static str, Arc<dyn Counter>)>,
    ) -> Self {
        let mut names = Vec::with_capacity(entries.len());
        for (metric, counter) in entries {
            let name = naming::counter_name(prefix, metric);
            match directory.register(&name, counter) {
                Ok(()) => names.push(name),
                Err(err) => log_classified(&name, &err, "request counter not registered"),
            }
        }
        Self { directory, names }
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    /// Remove every published name. Later calls find nothing left to remove.
    pub(crate) fn deregister(&mut self) {
        for name in std::mem::take(&mut self.names) {
            if !self.directory.remove(&name) {
                warn!(counter = %name, "request counter already missing from directory");
            }
        }
    }
}
