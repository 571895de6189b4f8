//! Application context

use std::sync::Arc;

use blobmeter_common::Clock;
use blobmeter_core::{MeterContext, MetricsResult};
use blobmeter_domain::MeterConfig;
use tracing::info;

/// Holds the meter context shared by every simulated request.
#[derive(Debug)]
pub struct AppContext {
    meter: MeterContext,
}

impl AppContext {
    pub fn new_with_config(config: MeterConfig) -> MetricsResult<Self> {
        let meter = MeterContext::builder().config(config).build()?;
        Ok(Self { meter })
    }

    /// Context reading time from `clock` instead of the system clock.
    pub fn new_with_clock(config: MeterConfig, clock: Arc<dyn Clock>) -> MetricsResult<Self> {
        let meter = MeterContext::builder().config(config).clock(clock).build()?;
        Ok(Self { meter })
    }

    pub fn meter(&self) -> &MeterContext {
        &self.meter
    }

    pub fn config(&self) -> &MeterConfig {
        self.meter.config()
    }

    /// Tear down every aggregate. Returns how many were removed.
    pub fn shutdown(&self) -> usize {
        let removed = self.meter.shutdown();
        info!(aggregates = removed, "application context shut down");
        removed
    }
}
