//! Integration tests for concurrent simulated traffic

use std::sync::Arc;
use std::time::Duration;

use blobmeter_app::{AppContext, Provider, Scenario, SimulationSettings, Simulator};
use blobmeter_core::{CounterDirectory, MetricsOption};
use blobmeter_domain::{AggregateMetric, MeterConfig};

fn simulator(latency: Duration) -> Simulator {
    let context = Arc::new(AppContext::new_with_config(MeterConfig::default()).unwrap());
    Simulator::new(context, SimulationSettings { latency, part_size: 100, burst_blob_size: 250 })
}

fn total(sim: &Simulator, option: MetricsOption) -> i64 {
    sim.stats_all()
        .into_iter()
        .find(|(o, _)| *o == option)
        .map(|(_, value)| value)
        .unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_totals_match_request_mix() {
    let sim = simulator(Duration::from_millis(1));
    let requests = 35;
    let summary = sim.burst(requests).await;

    // Indexes 6, 13, 20, 27 and 34 fail.
    assert_eq!(summary.requests, requests);
    assert_eq!(summary.failed, 5);
    assert_eq!(summary.succeeded, 30);

    let successes = total(&sim, MetricsOption::SuccessfulPuts)
        + total(&sim, MetricsOption::SuccessfulGets);
    let failures =
        total(&sim, MetricsOption::FailedPuts) + total(&sim, MetricsOption::FailedGets);
    assert_eq!(successes, 30);
    assert_eq!(failures, 5);

    let retries = total(&sim, MetricsOption::PutRetries) + total(&sim, MetricsOption::GetRetries);
    // Indexes 4, 9, 14, 19, 24, 29 and 34; 34 fails first.
    assert_eq!(retries, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_leaves_no_transient_counters_or_ongoing_requests() {
    let sim = simulator(Duration::from_millis(1));
    sim.burst(20).await;

    let meter = sim.context().meter();
    for provider in Provider::ALL {
        let aggregate = meter.aggregate(&provider.key());
        assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
        assert_eq!(aggregate.read(AggregateMetric::OngoingGets), 0);
        assert_eq!(aggregate.read(AggregateMetric::ProviderSelected), 10);
    }

    let put_scope = &meter.config().naming.put_scope;
    let get_scope = &meter.config().naming.get_scope;
    assert!(meter.directory().names_with_prefix(put_scope).is_empty());
    assert!(meter.directory().names_with_prefix(get_scope).is_empty());
}

#[tokio::test]
async fn aborted_transfer_is_counted_as_failed() {
    let sim = simulator(Duration::from_secs(30));
    let worker = sim.clone();
    let handle =
        tokio::spawn(async move { worker.put_blob(Provider::Aws, 500, Scenario::Success).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    let aggregate = sim.context().meter().aggregate(&Provider::Aws.key());
    assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
    assert_eq!(aggregate.read(AggregateMetric::FailedPuts), 1);
}
