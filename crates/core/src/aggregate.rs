//! Per-tenant running totals
//!
//! One [`PersistentAggregate`] exists per [`TenantKey`]. Many trackers feed
//! it concurrently; every update is an independent atomic operation and no
//! consistency across counters is implied.
//!
//! Counters outside the aggregate's [`CounterSet`] are never registered and
//! updates to them are silent no-ops, so callers never need to know which
//! deployment schema is active.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use blobmeter_common::{log_classified, Counter, CounterCell, ThroughputCounter};
use blobmeter_domain::{AggregateMetric, CounterSet, TenantKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::CounterDirectory;
use crate::naming;

/// Point-in-time copy of an aggregate's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub key: TenantKey,
    pub taken_at: DateTime<Utc>,
    /// Metric name to value, for counters in the aggregate's set.
    pub counters: BTreeMap<String, i64>,
}

impl AggregateSnapshot {
    /// Value of `metric`; counters outside the set read as zero.
    pub fn get(&self, metric: AggregateMetric) -> i64 {
        self.counters.get(metric.name()).copied().unwrap_or(0)
    }
}

/// Running totals for one tenant key.
pub struct PersistentAggregate {
    key: TenantKey,
    counter_set: CounterSet,
    directory: Arc<dyn CounterDirectory>,
    /// Indexed by `AggregateMetric as usize`; `None` for throughput metrics
    /// and for metrics outside the set.
    cells: Vec<Option<Arc<CounterCell>>>,
    put_throughput: Option<Arc<ThroughputCounter>>,
    get_throughput: Option<Arc<ThroughputCounter>>,
    registered: Vec<String>,
    deregistered: AtomicBool,
}

impl PersistentAggregate {
    /// Build the aggregate and publish its counters under
    /// `<scope>.<key>.<metric>`.
    ///
    /// Duplicate names are logged; the directory keeps whichever counter
    /// was there first.
    pub fn register(
        key: TenantKey,
        scope: &str,
        counter_set: CounterSet,
        directory: Arc<dyn CounterDirectory>,
    ) -> Self {
        let prefix = naming::aggregate_prefix(scope, &key);
        let mut cells = vec![None; AggregateMetric::ALL.len()];
        let mut put_throughput = None;
        let mut get_throughput = None;
        let mut registered = Vec::new();

        for metric in counter_set.metrics() {
            let counter: Arc<dyn Counter> = match metric {
                AggregateMetric::PutThroughput => {
                    let counter = Arc::new(ThroughputCounter::new());
                    put_throughput = Some(Arc::clone(&counter));
                    counter
                }
                AggregateMetric::GetThroughput => {
                    let counter = Arc::new(ThroughputCounter::new());
                    get_throughput = Some(Arc::clone(&counter));
                    counter
                }
                _ => {
                    let cell = Arc::new(CounterCell::new());
                    cells[metric as usize] = Some(Arc::clone(&cell));
                    cell
                }
            };

            let name = naming::counter_name(&prefix, metric.name());
            match directory.register(&name, counter) {
                Ok(()) => registered.push(name),
                Err(err) => log_classified(&name, &err, "aggregate counter not registered"),
            }
        }

        debug!(key = %key, counters = registered.len(), "aggregate counters registered");

        Self {
            key,
            counter_set,
            directory,
            cells,
            put_throughput,
            get_throughput,
            registered,
            deregistered: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &TenantKey {
        &self.key
    }

    pub fn counter_set(&self) -> CounterSet {
        self.counter_set
    }

    /// Full names this aggregate published.
    pub fn counter_names(&self) -> &[String] {
        &self.registered
    }

    /// Current value of `metric`; metrics outside the set read as zero.
    pub fn read(&self, metric: AggregateMetric) -> i64 {
        match metric {
            AggregateMetric::PutThroughput => self.put_throughput.as_ref().map_or(0, |c| c.value()),
            AggregateMetric::GetThroughput => self.get_throughput.as_ref().map_or(0, |c| c.value()),
            _ => self.cell(metric).map_or(0, CounterCell::get),
        }
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        let counters = self
            .counter_set
            .metrics()
            .map(|metric| (metric.name().to_string(), self.read(metric)))
            .collect();
        AggregateSnapshot { key: self.key.clone(), taken_at: Utc::now(), counters }
    }

    /// Remove every published counter. Only the first call has an effect.
    pub(crate) fn deregister(&self) -> usize {
        if self.deregistered.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let mut removed = 0;
        for name in &self.registered {
            if self.directory.remove(name) {
                removed += 1;
            } else {
                warn!(counter = %name, "aggregate counter already missing from directory");
            }
        }
        removed
    }

    fn cell(&self, metric: AggregateMetric) -> Option<&CounterCell> {
        self.cells.get(metric as usize).and_then(Option::as_deref)
    }

    fn add(&self, metric: AggregateMetric, amount: u64) {
        if let Some(cell) = self.cell(metric) {
            cell.add(to_i64(amount));
        }
    }

    fn inc(&self, metric: AggregateMetric) {
        if let Some(cell) = self.cell(metric) {
            cell.inc();
        }
    }

    fn dec(&self, metric: AggregateMetric) {
        if let Some(cell) = self.cell(metric) {
            cell.dec();
        }
    }

    // PUT totals

    pub fn add_bytes_up(&self, bytes: u64) {
        self.add(AggregateMetric::BytesUp, bytes);
    }

    pub fn add_put_time(&self, millis: u64) {
        self.add(AggregateMetric::PutTime, millis);
    }

    pub fn inc_successful_puts(&self) {
        self.inc(AggregateMetric::SuccessfulPuts);
    }

    pub fn add_persisted_bytes_up(&self, bytes: u64) {
        self.add(AggregateMetric::PersistedBytesUp, bytes);
    }

    pub fn add_persisted_put_time(&self, millis: u64) {
        self.add(AggregateMetric::PersistedPutTime, millis);
    }

    pub fn inc_failed_puts(&self) {
        self.inc(AggregateMetric::FailedPuts);
    }

    pub fn inc_put_retries(&self) {
        self.inc(AggregateMetric::PutRetries);
    }

    pub fn inc_part_errors(&self) {
        self.inc(AggregateMetric::PartErrors);
    }

    pub fn add_part_errors_time(&self, millis: u64) {
        self.add(AggregateMetric::PartErrorsTime, millis);
    }

    pub fn add_parts_persisted(&self, parts: u64) {
        self.add(AggregateMetric::PartsPersisted, parts);
    }

    pub fn inc_parts_put(&self) {
        self.inc(AggregateMetric::PartsPut);
    }

    pub fn inc_ongoing_puts(&self) {
        self.inc(AggregateMetric::OngoingPuts);
    }

    pub fn dec_ongoing_puts(&self) {
        self.dec(AggregateMetric::OngoingPuts);
    }

    // GET totals

    pub fn add_bytes_down(&self, bytes: u64) {
        self.add(AggregateMetric::BytesDown, bytes);
    }

    /// Add one read slice, raising the longest-slice counter if needed.
    pub fn add_get_data_time(&self, millis: u64) {
        self.add(AggregateMetric::GetDataTime, millis);
        if let Some(max) = self.cell(AggregateMetric::MaxGetSliceTime) {
            max.fetch_max(to_i64(millis));
        }
    }

    pub fn inc_successful_gets(&self) {
        self.inc(AggregateMetric::SuccessfulGets);
    }

    pub fn add_persisted_bytes_down(&self, bytes: u64) {
        self.add(AggregateMetric::PersistedBytesDown, bytes);
    }

    pub fn add_persisted_get_time(&self, millis: u64) {
        self.add(AggregateMetric::PersistedGetTime, millis);
    }

    pub fn inc_failed_gets(&self) {
        self.inc(AggregateMetric::FailedGets);
    }

    pub fn inc_get_retries(&self) {
        self.inc(AggregateMetric::GetRetries);
    }

    pub fn inc_get_errors(&self) {
        self.inc(AggregateMetric::GetErrors);
    }

    pub fn add_get_errors_time(&self, millis: u64) {
        self.add(AggregateMetric::GetErrorsTime, millis);
    }

    pub fn inc_ongoing_gets(&self) {
        self.inc(AggregateMetric::OngoingGets);
    }

    pub fn dec_ongoing_gets(&self) {
        self.dec(AggregateMetric::OngoingGets);
    }

    // Throughput

    pub fn add_put_throughput_sample(&self, bytes: u64, millis: u64) {
        if let Some(throughput) = &self.put_throughput {
            throughput.add_data_point(bytes, millis);
        }
    }

    pub fn add_get_throughput_sample(&self, bytes: u64, millis: u64) {
        if let Some(throughput) = &self.get_throughput {
            throughput.add_data_point(bytes, millis);
        }
    }

    /// Time spent on a GET that moved no data still lowers throughput.
    pub fn add_get_throughput_time(&self, millis: u64) {
        if let Some(throughput) = &self.get_throughput {
            throughput.add_time(millis);
        }
    }

    // Provider usage

    pub fn record_provider_selected(&self) {
        self.inc(AggregateMetric::ProviderSelected);
    }

    pub fn set_sampled_latency(&self, millis: u64) {
        if let Some(cell) = self.cell(AggregateMetric::SampledLatency) {
            cell.set(to_i64(millis));
        }
    }

    pub fn add_put_queue_latency(&self, millis: u64) {
        self.add(AggregateMetric::PutQueueLatency, millis);
    }

    pub fn add_get_queue_latency(&self, millis: u64) {
        self.add(AggregateMetric::GetQueueLatency, millis);
    }
}

impl fmt::Debug for PersistentAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentAggregate")
            .field("key", &self.key)
            .field("counter_set", &self.counter_set)
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryCounterDirectory;

    fn aggregate(set: CounterSet) -> (Arc<InMemoryCounterDirectory>, PersistentAggregate) {
        let directory = Arc::new(InMemoryCounterDirectory::new());
        let aggregate =
            PersistentAggregate::register(TenantKey::aws(), "blobmeter", set, directory.clone());
        (directory, aggregate)
    }

    #[test]
    fn full_set_registers_every_counter() {
        let (directory, aggregate) = aggregate(CounterSet::full());
        assert_eq!(directory.len(), AggregateMetric::ALL.len());
        assert_eq!(aggregate.counter_names().len(), AggregateMetric::ALL.len());
        assert!(directory.contains("blobmeter.AWS_METRICS.total.number.put.retries"));
    }

    #[test]
    fn basic_set_ignores_detail_updates() {
        let (directory, aggregate) = aggregate(CounterSet::basic());
        assert_eq!(directory.len(), 6);

        aggregate.inc_put_retries();
        aggregate.inc_ongoing_puts();
        aggregate.add_put_throughput_sample(100, 10);
        aggregate.add_bytes_up(64);

        assert_eq!(aggregate.read(AggregateMetric::PutRetries), 0);
        assert_eq!(aggregate.read(AggregateMetric::PutThroughput), 0);
        assert_eq!(directory.read("blobmeter.AWS_METRICS.bytes.total.up"), Some(64));
    }

    #[test]
    fn get_data_time_tracks_longest_slice() {
        let (_, aggregate) = aggregate(CounterSet::full());
        aggregate.add_get_data_time(40);
        aggregate.add_get_data_time(90);
        aggregate.add_get_data_time(15);

        assert_eq!(aggregate.read(AggregateMetric::GetDataTime), 145);
        assert_eq!(aggregate.read(AggregateMetric::MaxGetSliceTime), 90);
    }

    #[test]
    fn provider_usage_counters() {
        let (_, aggregate) = aggregate(CounterSet::full());
        aggregate.record_provider_selected();
        aggregate.record_provider_selected();
        aggregate.set_sampled_latency(30);
        aggregate.set_sampled_latency(12);
        aggregate.add_put_queue_latency(5);
        aggregate.add_get_queue_latency(7);

        let snapshot = aggregate.snapshot();
        assert_eq!(snapshot.get(AggregateMetric::ProviderSelected), 2);
        assert_eq!(snapshot.get(AggregateMetric::SampledLatency), 12);
        assert_eq!(snapshot.get(AggregateMetric::PutQueueLatency), 5);
        assert_eq!(snapshot.get(AggregateMetric::GetQueueLatency), 7);
    }

    #[test]
    fn throughput_reads_bytes_per_second() {
        let (_, aggregate) = aggregate(CounterSet::full());
        aggregate.add_get_throughput_sample(3_000, 1_500);
        aggregate.add_get_throughput_time(1_500);
        assert_eq!(aggregate.read(AggregateMetric::GetThroughput), 1_000);
    }

    #[test]
    fn deregister_is_idempotent() {
        let (directory, aggregate) = aggregate(CounterSet::full());
        assert_eq!(aggregate.deregister(), AggregateMetric::ALL.len());
        assert_eq!(aggregate.deregister(), 0);
        assert!(directory.is_empty());
    }

    #[test]
    fn snapshot_serializes() {
        let (_, aggregate) = aggregate(CounterSet::basic());
        aggregate.inc_successful_gets();
        let json = serde_json::to_value(aggregate.snapshot()).unwrap();
        assert_eq!(json["key"], serde_json::json!(["AWS_METRICS"]));
        assert_eq!(json["counters"]["total.successful.get.requests"], 1);
    }
}
