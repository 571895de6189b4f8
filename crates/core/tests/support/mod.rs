//! Shared test helpers for `blobmeter-core` integration tests.
//!
//! These helpers build a context driven by a mock clock and provide a
//! directory that refuses registrations, so lifecycle tests can focus on
//! accounting instead of setup.

#![allow(dead_code)]

pub mod directory;

use std::sync::Arc;

use blobmeter_common::MockClock;
use blobmeter_core::{CounterDirectory, InMemoryCounterDirectory, MeterContext};
use blobmeter_domain::MeterConfig;

/// A context, its directory, and the clock driving it.
pub struct Harness {
    pub clock: MockClock,
    pub directory: Arc<InMemoryCounterDirectory>,
    pub context: MeterContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(MeterConfig::default())
    }

    pub fn with_config(config: MeterConfig) -> Self {
        let clock = MockClock::new();
        let directory = Arc::new(InMemoryCounterDirectory::new());
        let context = MeterContext::builder()
            .config(config)
            .directory(directory.clone())
            .clock(Arc::new(clock.clone()))
            .build()
            .expect("test configuration is valid");
        Self { clock, directory, context }
    }

    /// Names of per-request counters still published.
    pub fn transient_names(&self) -> Vec<String> {
        let aggregate_prefix = format!("{}.", self.context.config().naming.aggregate_scope);
        self.directory
            .names()
            .into_iter()
            .filter(|name| !name.starts_with(&aggregate_prefix))
            .collect()
    }
}
