//! Process-scoped metering context
//!
//! [`MeterContext`] owns the directory, registry, clock, configuration and
//! request-id sequence. Build one at startup and share it (it is cheap to
//! put behind an `Arc`); trackers are created through it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use blobmeter_common::{Clock, SystemClock};
use blobmeter_domain::{MeterConfig, TenantKey};
use tracing::{debug, info};

use crate::aggregate::PersistentAggregate;
use crate::directory::{CounterDirectory, InMemoryCounterDirectory};
use crate::error::MetricsResult;
use crate::naming;
use crate::registry::AggregateRegistry;
use crate::report::{MetricsOption, MetricsReport};
use crate::tracker::{GetTracker, PutTracker, TrackerSeed};

/// Builder for [`MeterContext`]
#[derive(Debug, Default)]
pub struct MeterContextBuilder {
    config: Option<MeterConfig>,
    directory: Option<Arc<dyn CounterDirectory>>,
    clock: Option<Arc<dyn Clock>>,
}

impl MeterContextBuilder {
    pub fn config(mut self, config: MeterConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn CounterDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build the context.
    pub fn build(self) -> MetricsResult<MeterContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let default_key = config.default_tenant_key()?;

        let directory: Arc<dyn CounterDirectory> =
            self.directory.unwrap_or_else(|| Arc::new(InMemoryCounterDirectory::new()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let registry = AggregateRegistry::new(
            Arc::clone(&directory),
            config.naming.aggregate_scope.clone(),
            config.counters,
        );

        info!(
            aggregate_scope = %config.naming.aggregate_scope,
            default_key = %default_key,
            persisted_put_time = %config.persisted_put_time,
            "meter context ready"
        );

        Ok(MeterContext {
            config,
            default_key,
            directory,
            clock,
            registry,
            next_request: AtomicU64::new(0),
        })
    }
}

/// Owner of every aggregate and the factory for trackers.
#[derive(Debug)]
pub struct MeterContext {
    config: MeterConfig,
    default_key: TenantKey,
    directory: Arc<dyn CounterDirectory>,
    clock: Arc<dyn Clock>,
    registry: AggregateRegistry,
    next_request: AtomicU64,
}

impl MeterContext {
    pub fn builder() -> MeterContextBuilder {
        MeterContextBuilder::default()
    }

    /// Context with default configuration, an in-memory directory and the
    /// system clock.
    pub fn with_defaults() -> MetricsResult<Self> {
        Self::builder().build()
    }

    /// Start tracking a PUT for `key`, or the default key when `None`.
    pub fn put_tracker(&self, key: Option<TenantKey>) -> PutTracker {
        let seed = self.seed(key, &self.config.naming.put_scope);
        PutTracker::new(seed, self.config.persisted_put_time)
    }

    /// Start tracking a GET for `key`, or the default key when `None`.
    pub fn get_tracker(&self, key: Option<TenantKey>) -> GetTracker {
        let seed = self.seed(key, &self.config.naming.get_scope);
        GetTracker::new(seed)
    }

    /// Aggregate for `key`, created on first use.
    pub fn aggregate(&self, key: &TenantKey) -> Arc<PersistentAggregate> {
        self.registry.get_or_create(key)
    }

    /// Read `options` for `key` through the directory.
    pub fn report(&self, key: &TenantKey, options: &[MetricsOption]) -> MetricsReport {
        MetricsReport::collect(
            self.directory.as_ref(),
            &self.config.naming.aggregate_scope,
            key,
            options,
        )
    }

    /// Reset every aggregate and remove its counters.
    ///
    /// Trackers still in flight keep updating their detached aggregate.
    pub fn shutdown(&self) -> usize {
        let removed = self.registry.reset_all();
        info!(aggregates = removed, "meter context shut down");
        removed
    }

    pub fn registry(&self) -> &AggregateRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &Arc<dyn CounterDirectory> {
        &self.directory
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn default_key(&self) -> &TenantKey {
        &self.default_key
    }

    fn seed(&self, key: Option<TenantKey>, scope: &str) -> TrackerSeed {
        let key = key.unwrap_or_else(|| self.default_key.clone());
        let aggregate = self.registry.get_or_create(&key);
        let seq = self.next_request.fetch_add(1, Ordering::Relaxed);
        let request_id = naming::request_id(&key, seq);
        debug!(request_id = %request_id, key = %key, scope, "request id allocated");

        TrackerSeed {
            request_id,
            key,
            aggregate,
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
            scope: scope.to_string(),
        }
    }
}
