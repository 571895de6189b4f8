//! Aggregate registry
//!
//! Lazily creates exactly one [`PersistentAggregate`] per [`TenantKey`].
//! Lookups of an existing key take no creation lock; a miss takes the
//! creation lock, looks again and only then creates.

use std::sync::Arc;

use blobmeter_domain::{CounterSet, TenantKey};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::aggregate::PersistentAggregate;
use crate::directory::CounterDirectory;

/// Index of aggregates by tenant key.
#[derive(Debug)]
pub struct AggregateRegistry {
    directory: Arc<dyn CounterDirectory>,
    scope: String,
    counter_set: CounterSet,
    aggregates: DashMap<TenantKey, Arc<PersistentAggregate>>,
    /// Held only while creating or removing an aggregate.
    creation_lock: Mutex<()>,
}

impl AggregateRegistry {
    /// Aggregates created by this registry publish counters under `scope`
    /// and carry `counter_set`.
    pub fn new(
        directory: Arc<dyn CounterDirectory>,
        scope: impl Into<String>,
        counter_set: CounterSet,
    ) -> Self {
        Self {
            directory,
            scope: scope.into(),
            counter_set,
            aggregates: DashMap::new(),
            creation_lock: Mutex::new(()),
        }
    }

    /// Existing aggregate for `key`, if any.
    pub fn get(&self, key: &TenantKey) -> Option<Arc<PersistentAggregate>> {
        self.aggregates.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Aggregate for `key`, creating and registering it on first use.
    pub fn get_or_create(&self, key: &TenantKey) -> Arc<PersistentAggregate> {
        if let Some(existing) = self.get(key) {
            return existing;
        }

        let _guard = self.creation_lock.lock();
        if let Some(existing) = self.get(key) {
            return existing;
        }

        let aggregate = Arc::new(PersistentAggregate::register(
            key.clone(),
            &self.scope,
            self.counter_set,
            Arc::clone(&self.directory),
        ));
        self.aggregates.insert(key.clone(), Arc::clone(&aggregate));
        info!(key = %key, scope = %self.scope, "aggregate created");
        aggregate
    }

    /// Drop `aggregate` from the registry and remove its counters.
    ///
    /// Returns `false` when `aggregate` is no longer the registered
    /// instance for its key (already reset, or replaced since).
    pub fn reset(&self, aggregate: &Arc<PersistentAggregate>) -> bool {
        let _guard = self.creation_lock.lock();
        let removed = self
            .aggregates
            .remove_if(aggregate.key(), |_, current| Arc::ptr_eq(current, aggregate))
            .is_some();

        if removed {
            let counters = aggregate.deregister();
            info!(key = %aggregate.key(), counters, "aggregate reset");
        } else {
            debug!(key = %aggregate.key(), "reset skipped, aggregate not registered");
        }
        removed
    }

    /// Reset every aggregate. Returns how many were removed.
    pub fn reset_all(&self) -> usize {
        let _guard = self.creation_lock.lock();
        let keys: Vec<TenantKey> =
            self.aggregates.iter().map(|entry| entry.key().clone()).collect();
        let mut removed = 0;
        for key in keys {
            if let Some((_, aggregate)) = self.aggregates.remove(&key) {
                aggregate.deregister();
                removed += 1;
            }
        }
        if removed > 0 {
            info!(aggregates = removed, "all aggregates reset");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<TenantKey> {
        let mut keys: Vec<TenantKey> =
            self.aggregates.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn counter_set(&self) -> CounterSet {
        self.counter_set
    }
}
