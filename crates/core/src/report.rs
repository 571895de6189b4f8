//! Reporting by counter name
//!
//! A [`MetricsReport`] reads selected aggregate totals through a
//! [`CounterDirectory`] using the naming convention alone, so it works
//! against any directory holding the aggregate's counters.

use blobmeter_domain::{impl_snake_case_conversions, AggregateMetric, TenantKey};
use serde::{Deserialize, Serialize};

use crate::directory::CounterDirectory;
use crate::naming;

/// Queryable aggregate totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsOption {
    BytesUp,
    PersistedBytesUp,
    SuccessfulPuts,
    FailedPuts,
    PutRetries,
    PutTime,
    PersistedPutTime,
    PartErrors,
    PartErrorsTime,
    PersistedParts,
    PartsPut,
    BytesDown,
    PersistedBytesDown,
    SuccessfulGets,
    FailedGets,
    GetRetries,
    GetTime,
    PersistedGetTime,
    GetErrors,
    GetErrorsTime,
}

impl_snake_case_conversions!(MetricsOption {
    BytesUp => "bytes_up",
    PersistedBytesUp => "persisted_bytes_up",
    SuccessfulPuts => "successful_puts",
    FailedPuts => "failed_puts",
    PutRetries => "put_retries",
    PutTime => "put_time",
    PersistedPutTime => "persisted_put_time",
    PartErrors => "part_errors",
    PartErrorsTime => "part_errors_time",
    PersistedParts => "persisted_parts",
    PartsPut => "parts_put",
    BytesDown => "bytes_down",
    PersistedBytesDown => "persisted_bytes_down",
    SuccessfulGets => "successful_gets",
    FailedGets => "failed_gets",
    GetRetries => "get_retries",
    GetTime => "get_time",
    PersistedGetTime => "persisted_get_time",
    GetErrors => "get_errors",
    GetErrorsTime => "get_errors_time",
});

impl MetricsOption {
    pub const ALL: [Self; 20] = [
        Self::BytesUp,
        Self::PersistedBytesUp,
        Self::SuccessfulPuts,
        Self::FailedPuts,
        Self::PutRetries,
        Self::PutTime,
        Self::PersistedPutTime,
        Self::PartErrors,
        Self::PartErrorsTime,
        Self::PersistedParts,
        Self::PartsPut,
        Self::BytesDown,
        Self::PersistedBytesDown,
        Self::SuccessfulGets,
        Self::FailedGets,
        Self::GetRetries,
        Self::GetTime,
        Self::PersistedGetTime,
        Self::GetErrors,
        Self::GetErrorsTime,
    ];

    /// Aggregate counter backing this option.
    pub const fn metric(self) -> AggregateMetric {
        match self {
            Self::BytesUp => AggregateMetric::BytesUp,
            Self::PersistedBytesUp => AggregateMetric::PersistedBytesUp,
            Self::SuccessfulPuts => AggregateMetric::SuccessfulPuts,
            Self::FailedPuts => AggregateMetric::FailedPuts,
            Self::PutRetries => AggregateMetric::PutRetries,
            Self::PutTime => AggregateMetric::PutTime,
            Self::PersistedPutTime => AggregateMetric::PersistedPutTime,
            Self::PartErrors => AggregateMetric::PartErrors,
            Self::PartErrorsTime => AggregateMetric::PartErrorsTime,
            Self::PersistedParts => AggregateMetric::PartsPersisted,
            Self::PartsPut => AggregateMetric::PartsPut,
            Self::BytesDown => AggregateMetric::BytesDown,
            Self::PersistedBytesDown => AggregateMetric::PersistedBytesDown,
            Self::SuccessfulGets => AggregateMetric::SuccessfulGets,
            Self::FailedGets => AggregateMetric::FailedGets,
            Self::GetRetries => AggregateMetric::GetRetries,
            Self::GetTime => AggregateMetric::GetDataTime,
            Self::PersistedGetTime => AggregateMetric::PersistedGetTime,
            Self::GetErrors => AggregateMetric::GetErrors,
            Self::GetErrorsTime => AggregateMetric::GetErrorsTime,
        }
    }
}

/// Selected totals of one aggregate.
///
/// `None` means the option was not requested. A requested counter that is
/// not in the directory reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub bytes_up: Option<i64>,
    pub persisted_bytes_up: Option<i64>,
    pub successful_puts: Option<i64>,
    pub failed_puts: Option<i64>,
    pub put_retries: Option<i64>,
    pub put_time: Option<i64>,
    pub persisted_put_time: Option<i64>,
    pub part_errors: Option<i64>,
    pub part_errors_time: Option<i64>,
    pub persisted_parts: Option<i64>,
    pub parts_put: Option<i64>,
    pub bytes_down: Option<i64>,
    pub persisted_bytes_down: Option<i64>,
    pub successful_gets: Option<i64>,
    pub failed_gets: Option<i64>,
    pub get_retries: Option<i64>,
    pub get_time: Option<i64>,
    pub persisted_get_time: Option<i64>,
    pub get_errors: Option<i64>,
    pub get_errors_time: Option<i64>,
}

impl MetricsReport {
    /// Read `options` for the aggregate `<scope>.<key>` from `directory`.
    pub fn collect(
        directory: &dyn CounterDirectory,
        scope: &str,
        key: &TenantKey,
        options: &[MetricsOption],
    ) -> Self {
        let prefix = naming::aggregate_prefix(scope, key);
        let mut report = Self::default();
        for option in options {
            let name = naming::counter_name(&prefix, option.metric().name());
            *report.slot_mut(*option) = Some(directory.read(&name).unwrap_or(0));
        }
        report
    }

    pub fn get(&self, option: MetricsOption) -> Option<i64> {
        match option {
            MetricsOption::BytesUp => self.bytes_up,
            MetricsOption::PersistedBytesUp => self.persisted_bytes_up,
            MetricsOption::SuccessfulPuts => self.successful_puts,
            MetricsOption::FailedPuts => self.failed_puts,
            MetricsOption::PutRetries => self.put_retries,
            MetricsOption::PutTime => self.put_time,
            MetricsOption::PersistedPutTime => self.persisted_put_time,
            MetricsOption::PartErrors => self.part_errors,
            MetricsOption::PartErrorsTime => self.part_errors_time,
            MetricsOption::PersistedParts => self.persisted_parts,
            MetricsOption::PartsPut => self.parts_put,
            MetricsOption::BytesDown => self.bytes_down,
            MetricsOption::PersistedBytesDown => self.persisted_bytes_down,
            MetricsOption::SuccessfulGets => self.successful_gets,
            MetricsOption::FailedGets => self.failed_gets,
            MetricsOption::GetRetries => self.get_retries,
            MetricsOption::GetTime => self.get_time,
            MetricsOption::PersistedGetTime => self.persisted_get_time,
            MetricsOption::GetErrors => self.get_errors,
            MetricsOption::GetErrorsTime => self.get_errors_time,
        }
    }

    /// Requested options and their values, in option order.
    pub fn entries(&self) -> Vec<(MetricsOption, i64)> {
        MetricsOption::ALL
            .iter()
            .filter_map(|option| self.get(*option).map(|value| (*option, value)))
            .collect()
    }

    fn slot_mut(&mut self, option: MetricsOption) -> &mut Option<i64> {
        match option {
            MetricsOption::BytesUp => &mut self.bytes_up,
            MetricsOption::PersistedBytesUp => &mut self.persisted_bytes_up,
            MetricsOption::SuccessfulPuts => &mut self.successful_puts,
            MetricsOption::FailedPuts => &mut self.failed_puts,
            MetricsOption::PutRetries => &mut self.put_retries,
            MetricsOption::PutTime => &mut self.put_time,
            MetricsOption::PersistedPutTime => &mut self.persisted_put_time,
            MetricsOption::PartErrors => &mut self.part_errors,
            MetricsOption::PartErrorsTime => &mut self.part_errors_time,
            MetricsOption::PersistedParts => &mut self.persisted_parts,
            MetricsOption::PartsPut => &mut self.parts_put,
            MetricsOption::BytesDown => &mut self.bytes_down,
            MetricsOption::PersistedBytesDown => &mut self.persisted_bytes_down,
            MetricsOption::SuccessfulGets => &mut self.successful_gets,
            MetricsOption::FailedGets => &mut self.failed_gets,
            MetricsOption::GetRetries => &mut self.get_retries,
            MetricsOption::GetTime => &mut self.get_time,
            MetricsOption::PersistedGetTime => &mut self.persisted_get_time,
            MetricsOption::GetErrors => &mut self.get_errors,
            MetricsOption::GetErrorsTime => &mut self.get_errors_time,
        }
    }
}
