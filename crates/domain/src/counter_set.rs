//! Aggregate counter selection
//!
//! One aggregate type serves every deployment; the [`CounterSet`] picks
//! which optional counter groups it registers. The core group is always on.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::BlobMeterError;
use crate::metrics::{AggregateMetric, CounterGroup};

/// Which aggregate counter groups exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSet {
    pub detail: bool,
    pub throughput: bool,
    pub provider_usage: bool,
}

impl CounterSet {
    /// Every counter group.
    pub const fn full() -> Self {
        Self { detail: true, throughput: true, provider_usage: true }
    }

    /// Only the six core counters (the per-provider schema).
    pub const fn basic() -> Self {
        Self { detail: false, throughput: false, provider_usage: false }
    }

    pub const fn includes_group(&self, group: CounterGroup) -> bool {
        match group {
            CounterGroup::Core => true,
            CounterGroup::Detail => self.detail,
            CounterGroup::Throughput => self.throughput,
            CounterGroup::ProviderUsage => self.provider_usage,
        }
    }

    pub const fn contains(&self, metric: AggregateMetric) -> bool {
        self.includes_group(metric.group())
    }

    /// Selected metrics in catalogue order.
    pub fn metrics(&self) -> impl Iterator<Item = AggregateMetric> + '_ {
        AggregateMetric::ALL.iter().copied().filter(|m| self.contains(*m))
    }
}

impl Default for CounterSet {
    fn default() -> Self {
        Self::full()
    }
}

/// Parses `full`, `basic`, or a comma separated list of optional groups
/// (`detail`, `throughput`, `provider_usage`) on top of the core group.
impl FromStr for CounterSet {
    type Err = BlobMeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "full" => return Ok(Self::full()),
            "basic" | "core" => return Ok(Self::basic()),
            _ => {}
        }

        let mut set = Self::basic();
        for group in normalized.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            match group {
                "core" => {}
                "detail" => set.detail = true,
                "throughput" => set.throughput = true,
                "provider_usage" => set.provider_usage = true,
                other => {
                    return Err(BlobMeterError::InvalidInput(format!(
                        "Invalid counter group: {other}"
                    )))
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_contains_everything() {
        let set = CounterSet::full();
        assert_eq!(set.metrics().count(), AggregateMetric::ALL.len());
        assert_eq!(set, CounterSet::default());
    }

    #[test]
    fn basic_contains_core_only() {
        let set = CounterSet::basic();
        let names: Vec<_> = set.metrics().map(|m| m.name()).collect();
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"bytes.total.down"));
        assert!(!set.contains(AggregateMetric::OngoingPuts));
        assert!(!set.contains(AggregateMetric::PutThroughput));
    }

    #[test]
    fn parse_group_list() {
        let set: CounterSet = "detail, throughput".parse().unwrap();
        assert!(set.detail);
        assert!(set.throughput);
        assert!(!set.provider_usage);

        assert_eq!("FULL".parse::<CounterSet>().unwrap(), CounterSet::full());
        assert_eq!("basic".parse::<CounterSet>().unwrap(), CounterSet::basic());
        assert!("detail,latency".parse::<CounterSet>().is_err());
    }

    #[test]
    fn serde_missing_fields_take_full_defaults() {
        let set: CounterSet = serde_json::from_str(r#"{"detail": true}"#).unwrap();
        assert!(set.detail);
        assert!(set.throughput);
        assert!(set.provider_usage);
    }
}
