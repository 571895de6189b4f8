//! Integration tests for the PUT and GET lifecycle state machines
//!
//! Drives trackers through realistic event sequences with a mock clock and
//! checks what lands in the aggregate and the directory.

mod support;

use std::sync::Arc;

use blobmeter_core::{
    CounterDirectory, GetState, MeterContext, MetricsOption, PutState, RequestOutcome,
};
use blobmeter_domain::{AggregateMetric, CounterSet, MeterConfig, TenantKey};
use support::directory::RejectingDirectory;
use support::Harness;

// ============================================================================
// PUT scenarios
// ============================================================================

/// Single segment stored on the first attempt.
///
/// Scenario: `start(100)` then the stream moves to 100, then success.
#[test]
fn test_put_single_segment_success() {
    let harness = Harness::new();
    let key = TenantKey::pair("photos", "eu").unwrap();
    let mut put = harness.context.put_tracker(Some(key.clone()));

    put.start(100);
    harness.clock.advance_millis(25);
    put.boundary_event(100);
    put.complete(RequestOutcome::Succeeded);

    let aggregate = harness.context.aggregate(&key);
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 100);
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulPuts), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartsPut), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 1);
    assert_eq!(aggregate.read(AggregateMetric::BytesUp), 100);
    assert_eq!(aggregate.read(AggregateMetric::PutRetries), 0);
    assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
}

/// Failed segment resumed mid-way and finished on the retry.
///
/// Scenario: `start(100)`, stream moves to 50 (first half acknowledged),
/// `start(50)`, stream moves to 100, success.
#[test]
fn test_put_retry_after_partial_segment() {
    let harness = Harness::new();
    let key = TenantKey::aws();
    let mut put = harness.context.put_tracker(Some(key.clone()));

    put.start(100);
    harness.clock.advance_millis(10);
    put.boundary_event(50);
    assert_eq!(put.state(), PutState::RetryPending);
    assert_eq!(put.position(), 50);

    put.start(50);
    harness.clock.advance_millis(5);
    put.boundary_event(100);
    put.complete(RequestOutcome::Succeeded);

    let aggregate = harness.context.aggregate(&key);
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 100);
    assert_eq!(aggregate.read(AggregateMetric::PutRetries), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrorsTime), 10);
    assert_eq!(aggregate.read(AggregateMetric::PersistedPutTime), 5);
    assert_eq!(aggregate.read(AggregateMetric::BytesUp), 100);
}

/// A rewind to the segment start credits nothing from the failed attempt.
#[test]
fn test_put_rewind_does_not_count_failed_bytes() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    put.start(64);
    put.boundary_event(64);
    put.start(64);
    put.boundary_event(0);
    assert_eq!(put.persisted_bytes(), 64);
    put.start(64);
    put.boundary_event(64);
    put.start(64);
    put.boundary_event(128);
    put.succeed();

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 128 + 64);
    assert_eq!(aggregate.read(AggregateMetric::PutRetries), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 3);
}

/// Multipart upload finishing on end of input.
#[test]
fn test_put_multipart_end_of_input() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    for part in 0..3_u64 {
        put.start(1_000);
        harness.clock.advance_millis(100);
        put.boundary_event((part + 1) * 1_000);
    }
    put.start(500);
    harness.clock.advance_millis(50);
    put.end_of_input();
    assert_eq!(put.state(), PutState::PartComplete);
    put.succeed();

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 3_500);
    assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 4);
    assert_eq!(aggregate.read(AggregateMetric::PartsPut), 4);
    assert_eq!(aggregate.read(AggregateMetric::PersistedPutTime), 350);
    assert_eq!(aggregate.read(AggregateMetric::PutThroughput), 10_000);
}

/// A segment still in flight at success counts as stored.
#[test]
fn test_put_success_closes_in_flight_segment() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    put.start(300);
    put.succeed();

    let report = harness.context.report(
        harness.context.default_key(),
        &[MetricsOption::PersistedBytesUp, MetricsOption::PersistedParts],
    );
    assert_eq!(report.persisted_bytes_up, Some(300));
    assert_eq!(report.persisted_parts, Some(1));
}

/// Failure with a segment in flight records one part error and one failed put.
#[test]
fn test_put_failure_mid_segment() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    put.start(100);
    harness.clock.advance_millis(70);
    put.fail();

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::FailedPuts), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrorsTime), 70);
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulPuts), 0);
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 0);
}

/// Boundary events outside a segment are ignored.
#[test]
fn test_put_boundary_without_segment_is_ignored() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    put.boundary_event(500);
    assert_eq!(put.state(), PutState::Idle);
    assert_eq!(put.position(), 0);
    put.succeed();

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::PartErrors), 0);
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulPuts), 1);
}

/// Validates `PutTracker::complete` idempotency.
///
/// Assertions:
/// - Confirms only the first terminal call returns `true`.
/// - Confirms aggregate totals match a single completion.
/// - Confirms calls after completion leave the state `Finished`.
#[test]
fn test_put_complete_is_idempotent() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(None);

    put.start(10);
    put.boundary_event(10);
    assert!(put.succeed());
    assert!(!put.succeed());
    assert!(!put.fail());
    put.start(10);
    put.boundary_event(20);
    assert_eq!(put.state(), PutState::Finished);

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulPuts), 1);
    assert_eq!(aggregate.read(AggregateMetric::FailedPuts), 0);
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 10);
    assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
}

// ============================================================================
// GET scenarios
// ============================================================================

/// Read error followed by a successful retry.
///
/// Scenario: `start_read`, `error`, `start_read`, `bytes_read(200)`, success.
#[test]
fn test_get_retry_after_error() {
    let harness = Harness::new();
    let key = TenantKey::azure();
    let mut get = harness.context.get_tracker(Some(key.clone()));

    get.start_read();
    harness.clock.advance_millis(15);
    get.error();
    get.start_read();
    harness.clock.advance_millis(40);
    get.bytes_read(200);
    get.complete(RequestOutcome::Succeeded);

    let aggregate = harness.context.aggregate(&key);
    assert_eq!(aggregate.read(AggregateMetric::GetRetries), 1);
    assert_eq!(aggregate.read(AggregateMetric::BytesDown), 200);
    assert_eq!(aggregate.read(AggregateMetric::PersistedBytesDown), 200);
    assert_eq!(aggregate.read(AggregateMetric::GetErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::GetErrorsTime), 15);
    assert_eq!(aggregate.read(AggregateMetric::PersistedGetTime), 40);
    assert_eq!(aggregate.read(AggregateMetric::MaxGetSliceTime), 40);
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulGets), 1);
    assert_eq!(aggregate.read(AggregateMetric::OngoingGets), 0);
}

/// Failure while reading runs the error path first.
#[test]
fn test_get_failure_while_reading() {
    let harness = Harness::new();
    let mut get = harness.context.get_tracker(None);

    get.start_read();
    harness.clock.advance_millis(12);
    assert_eq!(get.state(), GetState::Reading);
    get.fail();

    let report = harness.context.report(
        harness.context.default_key(),
        &[MetricsOption::FailedGets, MetricsOption::GetErrors, MetricsOption::GetErrorsTime],
    );
    assert_eq!(report.failed_gets, Some(1));
    assert_eq!(report.get_errors, Some(1));
    assert_eq!(report.get_errors_time, Some(12));
    assert_eq!(report.successful_gets, None);
}

/// An error outside a read is counted but does not make a retry.
#[test]
fn test_get_error_without_read_is_not_retry() {
    let harness = Harness::new();
    let mut get = harness.context.get_tracker(None);

    get.error();
    get.start_read();
    get.bytes_read(5);
    get.succeed();

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::GetErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::GetRetries), 0);
}

#[test]
fn test_get_complete_is_idempotent() {
    let harness = Harness::new();
    let mut get = harness.context.get_tracker(None);

    get.start_read();
    get.bytes_read(8);
    assert!(get.succeed());
    assert!(!get.fail());
    get.bytes_read(8);

    let aggregate = harness.context.aggregate(harness.context.default_key());
    assert_eq!(aggregate.read(AggregateMetric::SuccessfulGets), 1);
    assert_eq!(aggregate.read(AggregateMetric::FailedGets), 0);
    assert_eq!(aggregate.read(AggregateMetric::BytesDown), 8);
}

// ============================================================================
// Cleanup and schema
// ============================================================================

/// Dropping trackers without a terminal call records failures and cleans up.
#[test]
fn test_dropped_trackers_complete_as_failures() {
    let harness = Harness::new();
    let key = TenantKey::aws();

    {
        let mut put = harness.context.put_tracker(Some(key.clone()));
        put.start(100);
        let mut get = harness.context.get_tracker(Some(key.clone()));
        get.start_read();

        let aggregate = harness.context.aggregate(&key);
        assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 1);
        assert_eq!(aggregate.read(AggregateMetric::OngoingGets), 1);
        assert_eq!(harness.transient_names().len(), 13);
    }

    let aggregate = harness.context.aggregate(&key);
    assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
    assert_eq!(aggregate.read(AggregateMetric::OngoingGets), 0);
    assert_eq!(aggregate.read(AggregateMetric::FailedPuts), 1);
    assert_eq!(aggregate.read(AggregateMetric::FailedGets), 1);
    assert_eq!(aggregate.read(AggregateMetric::PartErrors), 1);
    assert_eq!(aggregate.read(AggregateMetric::GetErrors), 1);
    assert!(harness.transient_names().is_empty());
}

/// Transient counters are visible while in flight and gone afterwards.
#[test]
fn test_transient_counters_visible_in_flight() {
    let harness = Harness::new();
    let mut put = harness.context.put_tracker(Some(TenantKey::aws()));

    put.start(100);
    harness.clock.advance_millis(33);

    let prefix = format!("PutToBackend.AWS_METRICS.{}", put.request_id());
    assert_eq!(harness.directory.read(&format!("{prefix}.put.time.spent.this.slice")), Some(33));

    put.boundary_event(100);
    assert_eq!(harness.directory.read(&format!("{prefix}.put.bytes.written")), Some(100));
    assert_eq!(harness.directory.read(&format!("{prefix}.put.parts")), Some(1));

    put.succeed();
    assert!(harness.transient_names().is_empty());
}

/// The provider-pair schema registers only the six core counters.
#[test]
fn test_basic_counter_set_schema() {
    let config = MeterConfig { counters: CounterSet::basic(), ..MeterConfig::default() };
    let harness = Harness::with_config(config);

    let mut put = harness.context.put_tracker(Some(TenantKey::aws()));
    put.start(100);
    put.boundary_event(40);
    put.start(60);
    put.boundary_event(100);
    put.succeed();

    let names = harness.directory.names_with_prefix("blobmeter.AWS_METRICS.");
    assert_eq!(
        names,
        vec![
            "blobmeter.AWS_METRICS.bytes.total.down",
            "blobmeter.AWS_METRICS.bytes.total.up",
            "blobmeter.AWS_METRICS.total.get.data.time",
            "blobmeter.AWS_METRICS.total.put.time",
            "blobmeter.AWS_METRICS.total.successful.get.requests",
            "blobmeter.AWS_METRICS.total.successful.put.requests",
        ]
    );

    let report = harness
        .context
        .report(&TenantKey::aws(), &[MetricsOption::BytesUp, MetricsOption::PutRetries]);
    assert_eq!(report.bytes_up, Some(100));
    assert_eq!(report.put_retries, Some(0));
}

/// Reset removes every aggregate counter; a later request recreates them.
#[test]
fn test_reset_and_recreate() {
    let harness = Harness::new();
    let key = TenantKey::azure();
    let aggregate = harness.context.aggregate(&key);
    let count = aggregate.counter_names().len();

    assert!(harness.context.registry().reset(&aggregate));
    assert!(harness.directory.names_with_prefix("blobmeter.AZURE_METRICS.").is_empty());

    let mut put = harness.context.put_tracker(Some(key.clone()));
    put.start(1);
    put.boundary_event(1);
    put.succeed();

    let fresh = harness.context.aggregate(&key);
    assert!(!Arc::ptr_eq(&aggregate, &fresh));
    assert_eq!(fresh.counter_names().len(), count);
    assert_eq!(fresh.read(AggregateMetric::SuccessfulPuts), 1);
}

/// Directory faults are absorbed; accounting still happens.
#[test]
fn test_directory_rejections_are_absorbed() {
    let directory = RejectingDirectory::new("put.errors");
    let context = MeterContext::builder().directory(directory.clone()).build().unwrap();

    let mut put = context.put_tracker(None);
    assert_eq!(put.counter_names().len(), 6);
    put.start(10);
    put.boundary_event(10);
    put.succeed();

    assert_eq!(directory.rejected(), 1);
    assert_eq!(
        context.aggregate(context.default_key()).read(AggregateMetric::PersistedBytesUp),
        10
    );
    assert!(directory.names_with_prefix("PutToBackend.").is_empty());
}
