//! Simulated blob transfers
//!
//! A [`Simulator`] plays the part of a storage gateway: it splits a blob
//! into parts, "sends" each part by sleeping for the configured latency,
//! and reports every step to a PUT or GET tracker exactly as a transport
//! would. Failures and retries are scripted by [`Scenario`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blobmeter_core::{MetricsOption, MetricsReport};
use blobmeter_domain::TenantKey;
use tokio::task::JoinSet;
use tracing::warn;

use crate::commands::Scenario;
use crate::context::AppContext;
use crate::utils::logging::log_transfer;

/// Totals printed by the stats commands.
pub const STATS_OPTIONS: [MetricsOption; 10] = [
    MetricsOption::BytesUp,
    MetricsOption::PutTime,
    MetricsOption::SuccessfulPuts,
    MetricsOption::FailedPuts,
    MetricsOption::PutRetries,
    MetricsOption::BytesDown,
    MetricsOption::GetTime,
    MetricsOption::SuccessfulGets,
    MetricsOption::FailedGets,
    MetricsOption::GetRetries,
];

/// Storage backend a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Aws,
    Azure,
}

impl Provider {
    pub const ALL: [Self; 2] = [Self::Aws, Self::Azure];

    /// Aggregate key the provider's requests feed.
    pub fn key(&self) -> TenantKey {
        match self {
            Self::Aws => TenantKey::aws(),
            Self::Azure => TenantKey::azure(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "AZURE",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of a simulated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Put => "PUT",
            Self::Get => "GET",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Simulated round trip of one part
    pub latency: Duration,
    /// Bytes sent per part
    pub part_size: u64,
    /// Size of every blob in a burst
    pub burst_blob_size: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(200),
            part_size: 1024 * 1024,
            burst_blob_size: 256 * 1024,
        }
    }
}

/// Outcome of one simulated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    pub provider: Provider,
    pub operation: Operation,
    pub request_id: String,
    pub scenario: Scenario,
    /// Bytes stored (PUT) or delivered (GET)
    pub bytes: u64,
    pub succeeded: bool,
    pub elapsed: Duration,
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} request {} ({}): {}, {} bytes in {} ms",
            self.provider,
            self.operation,
            self.request_id,
            self.scenario,
            if self.succeeded { "done" } else { "FAILED" },
            self.bytes,
            self.elapsed.as_millis()
        )
    }
}

/// Result of a concurrent burst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurstSummary {
    pub requests: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives PUT and GET trackers with scripted transfers.
#[derive(Debug, Clone)]
pub struct Simulator {
    context: Arc<AppContext>,
    settings: SimulationSettings,
}

impl Simulator {
    pub fn new(context: Arc<AppContext>, settings: SimulationSettings) -> Self {
        Self { context, settings }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Upload `size` bytes part by part.
    ///
    /// A failed part is reported by repositioning the stream to the part's
    /// own start, which the tracker classifies as a segment failure. The
    /// final part is closed by the end of input rather than a reposition.
    pub async fn put_blob(
        &self,
        provider: Provider,
        size: u64,
        scenario: Scenario,
    ) -> TransferSummary {
        let started = Instant::now();
        let meter = self.context.meter();
        self.note_provider_selected(provider);

        let mut tracker = meter.put_tracker(Some(provider.key()));
        let request_id = tracker.request_id().to_string();
        let mut position = 0;
        let mut failed_once = false;

        while position < size {
            let len = self.settings.part_size.min(size - position);
            tracker.start(len);
            self.network_delay().await;

            if !failed_once && scenario != Scenario::Success {
                failed_once = true;
                if scenario == Scenario::Failed {
                    tracker.fail();
                    return self.finish(
                        provider,
                        Operation::Put,
                        request_id,
                        scenario,
                        0,
                        false,
                        started,
                    );
                }
                tracker.boundary_event(position);
                continue;
            }

            position += len;
            if position < size {
                tracker.boundary_event(position);
            }
        }

        tracker.end_of_input();
        let bytes = tracker.persisted_bytes();
        tracker.succeed();
        self.finish(provider, Operation::Put, request_id, scenario, bytes, true, started)
    }

    /// Download `size` bytes slice by slice.
    pub async fn get_blob(
        &self,
        provider: Provider,
        size: u64,
        scenario: Scenario,
    ) -> TransferSummary {
        let started = Instant::now();
        let meter = self.context.meter();
        self.note_provider_selected(provider);

        let mut tracker = meter.get_tracker(Some(provider.key()));
        let request_id = tracker.request_id().to_string();
        let mut remaining = size;
        let mut failed_once = false;

        while remaining > 0 {
            let len = self.settings.part_size.min(remaining);
            tracker.start_read();
            self.network_delay().await;

            if !failed_once && scenario != Scenario::Success {
                failed_once = true;
                if scenario == Scenario::Failed {
                    tracker.fail();
                    return self.finish(
                        provider,
                        Operation::Get,
                        request_id,
                        scenario,
                        0,
                        false,
                        started,
                    );
                }
                tracker.error();
                continue;
            }

            tracker.bytes_read(len);
            remaining -= len;
        }

        let bytes = tracker.total_bytes_read();
        tracker.succeed();
        self.finish(provider, Operation::Get, request_id, scenario, bytes, true, started)
    }

    /// Run `requests` transfers concurrently.
    ///
    /// Requests alternate between providers and directions; every fifth one
    /// is retried and every seventh fails.
    pub async fn burst(&self, requests: usize) -> BurstSummary {
        let mut tasks = JoinSet::new();
        for index in 0..requests {
            let simulator = self.clone();
            tasks.spawn(async move {
                let provider = Provider::ALL[index % Provider::ALL.len()];
                let scenario = burst_scenario(index);
                let size = simulator.settings.burst_blob_size;
                if (index / Provider::ALL.len()) % 2 == 0 {
                    simulator.put_blob(provider, size, scenario).await
                } else {
                    simulator.get_blob(provider, size, scenario).await
                }
            });
        }

        let mut summary = BurstSummary { requests, ..BurstSummary::default() };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(transfer) if transfer.succeeded => summary.succeeded += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    warn!(error = %e, "burst task did not finish");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Stats totals for one provider.
    pub fn stats(&self, provider: Provider) -> MetricsReport {
        self.context.meter().report(&provider.key(), &STATS_OPTIONS)
    }

    /// Stats totals summed over every aggregate in the registry.
    pub fn stats_all(&self) -> Vec<(MetricsOption, i64)> {
        let meter = self.context.meter();
        let mut totals: Vec<(MetricsOption, i64)> =
            STATS_OPTIONS.iter().map(|option| (*option, 0)).collect();

        for key in meter.registry().keys() {
            let report = meter.report(&key, &STATS_OPTIONS);
            for (option, total) in &mut totals {
                *total += report.get(*option).unwrap_or(0);
            }
        }
        totals
    }

    fn note_provider_selected(&self, provider: Provider) {
        let aggregate = self.context.meter().aggregate(&provider.key());
        aggregate.record_provider_selected();
        let latency = u64::try_from(self.settings.latency.as_millis()).unwrap_or(u64::MAX);
        aggregate.set_sampled_latency(latency);
    }

    async fn network_delay(&self) {
        if !self.settings.latency.is_zero() {
            tokio::time::sleep(self.settings.latency).await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        provider: Provider,
        operation: Operation,
        request_id: String,
        scenario: Scenario,
        bytes: u64,
        succeeded: bool,
        started: Instant,
    ) -> TransferSummary {
        let summary = TransferSummary {
            provider,
            operation,
            request_id,
            scenario,
            bytes,
            succeeded,
            elapsed: started.elapsed(),
        };
        log_transfer(&summary);
        summary
    }
}

fn burst_scenario(index: usize) -> Scenario {
    if index % 7 == 6 {
        Scenario::Failed
    } else if index % 5 == 4 {
        Scenario::Retried
    } else {
        Scenario::Success
    }
}

/// Render report entries as aligned `label: value` lines under a title.
pub fn render_stats(title: &str, entries: &[(MetricsOption, i64)]) -> String {
    let rule = "=".repeat(46);
    let width = entries.iter().map(|(option, _)| option.as_str().len()).max().unwrap_or(0);
    let mut out = format!("{rule}\n{title}\n{rule}\n");
    for (option, value) in entries {
        out.push_str(&format!("{:<width$} : {value}\n", option.as_str()));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}
