//! Counter name catalogues
//!
//! Every counter the engine registers is named
//! `<scope>.<tenant key parts>.[<request id>.]<metric name>`. This module
//! holds the `<metric name>` part for aggregate and per-request counters.

use serde::{Deserialize, Serialize};

/// Optional groups of aggregate counters.
///
/// `Core` is always present; the others are selected by
/// [`CounterSet`](crate::CounterSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterGroup {
    Core,
    Detail,
    Throughput,
    ProviderUsage,
}

crate::counter_catalogue! {
    /// Permanent per-tenant counters held by an aggregate.
    pub enum AggregateMetric {
        BytesUp => "bytes.total.up",
        PutTime => "total.put.time",
        SuccessfulPuts => "total.successful.put.requests",
        BytesDown => "bytes.total.down",
        GetDataTime => "total.get.data.time",
        SuccessfulGets => "total.successful.get.requests",
        PersistedBytesUp => "persisted.bytes.total.up",
        PersistedPutTime => "total.persisted.put.time",
        FailedPuts => "failed.put.requests",
        PutRetries => "total.number.put.retries",
        PartErrors => "total.part.errors",
        PartErrorsTime => "total.part.errors.time",
        PartsPersisted => "total.parts.persisted",
        PartsPut => "total.parts.put",
        /// Gauge of PUT trackers not yet completed.
        OngoingPuts => "ongoing.put.requests",
        PersistedBytesDown => "persisted.bytes.total.down",
        PersistedGetTime => "total.persisted.get.time",
        FailedGets => "failed.get.requests",
        GetRetries => "total.number.get.retries",
        GetErrors => "total.get.errors",
        GetErrorsTime => "total.get.errors.time",
        /// Gauge of GET trackers not yet completed.
        OngoingGets => "ongoing.get.requests",
        /// Longest single GET data slice seen, in milliseconds.
        MaxGetSliceTime => "max.get.slice.time",
        PutThroughput => "provider.put.throughput",
        GetThroughput => "provider.get.throughput",
        ProviderSelected => "provider.used",
        SampledLatency => "provider.current.sampled.latency",
        PutQueueLatency => "provider.put.queue.latency",
        GetQueueLatency => "provider.get.queue.latency",
    }
}

impl AggregateMetric {
    /// Group this counter belongs to.
    pub const fn group(&self) -> CounterGroup {
        match self {
            Self::BytesUp
            | Self::PutTime
            | Self::SuccessfulPuts
            | Self::BytesDown
            | Self::GetDataTime
            | Self::SuccessfulGets => CounterGroup::Core,
            Self::PutThroughput | Self::GetThroughput => CounterGroup::Throughput,
            Self::ProviderSelected
            | Self::SampledLatency
            | Self::PutQueueLatency
            | Self::GetQueueLatency => CounterGroup::ProviderUsage,
            _ => CounterGroup::Detail,
        }
    }

    /// Gauges go up and down; everything else only grows.
    pub const fn is_gauge(&self) -> bool {
        matches!(self, Self::OngoingPuts | Self::OngoingGets | Self::SampledLatency)
    }
}

crate::counter_catalogue! {
    /// Transient counters registered for one in-flight PUT.
    pub enum PutMetric {
        BytesWritten => "put.bytes.written",
        Errors => "put.errors",
        Retries => "put.retries",
        TimeSpent => "put.time.spent",
        ErrorTime => "put.error.time",
        /// Elapsed time of the segment currently being written.
        SliceTime => "put.time.spent.this.slice",
        Parts => "put.parts",
    }
}

crate::counter_catalogue! {
    /// Transient counters registered for one in-flight GET.
    pub enum GetMetric {
        BytesRead => "get.bytes.read",
        Errors => "get.errors",
        Retries => "get.retries",
        TimeSpent => "get.time.spent",
        ErrorTime => "get.error.time",
        /// Elapsed time of the slice currently being read.
        SliceTime => "get.time.spent.this.slice",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn aggregate_names_are_unique() {
        let names: HashSet<_> = AggregateMetric::ALL.iter().map(AggregateMetric::name).collect();
        assert_eq!(names.len(), AggregateMetric::ALL.len());
        assert_eq!(AggregateMetric::ALL.len(), 29);
    }

    #[test]
    fn core_group_has_six_counters() {
        let core: Vec<_> = AggregateMetric::ALL
            .iter()
            .filter(|m| m.group() == CounterGroup::Core)
            .map(AggregateMetric::name)
            .collect();
        assert_eq!(
            core,
            vec![
                "bytes.total.up",
                "total.put.time",
                "total.successful.put.requests",
                "bytes.total.down",
                "total.get.data.time",
                "total.successful.get.requests",
            ]
        );
    }

    #[test]
    fn groups() {
        assert_eq!(AggregateMetric::OngoingPuts.group(), CounterGroup::Detail);
        assert_eq!(AggregateMetric::GetThroughput.group(), CounterGroup::Throughput);
        assert_eq!(AggregateMetric::SampledLatency.group(), CounterGroup::ProviderUsage);
        assert!(AggregateMetric::OngoingGets.is_gauge());
        assert!(!AggregateMetric::BytesUp.is_gauge());
    }

    #[test]
    fn transient_names() {
        assert_eq!(PutMetric::ALL.len(), 7);
        assert_eq!(GetMetric::ALL.len(), 6);
        assert_eq!(PutMetric::SliceTime.to_string(), "put.time.spent.this.slice");
        assert_eq!(GetMetric::BytesRead.name(), "get.bytes.read");
    }
}
