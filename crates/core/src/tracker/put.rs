//! PUT request tracker
//!
//! The transport reports a PUT as a stream of ambiguous low-level events:
//! a segment of bytes is handed over (`start`), later the stream is
//! repositioned (`boundary_event`) or runs dry (`end_of_input`), and finally
//! the caller reports the request outcome (`complete`). Nothing says why a
//! reposition happened, so the tracker classifies it by position:
//!
//! - landing exactly after the segment means the segment was stored and a
//!   new part begins
//! - landing anywhere else means the segment failed and will be resent from
//!   the new position
//!
//! The failure branch credits the acknowledged prefix: when the new
//! position lies inside the in-flight segment, the transport resumes after
//! bytes it already stored, so `[current, next)` counts as persisted. A
//! position past the segment end credits nothing.
//!
//! Positions come from the caller, so all position and total arithmetic
//! saturates instead of overflowing.

use std::fmt;
use std::sync::Arc;

use blobmeter_common::{Clock, Counter, CounterCell, ElapsedCounter};
use blobmeter_domain::{PersistedTimePolicy, PutMetric, TenantKey};
use tracing::{debug, warn};

use super::{RequestOutcome, TrackerSeed};
use crate::aggregate::{to_i64, PersistentAggregate};
use crate::naming;
use crate::transient::TransientCounters;

/// Observable phase of a PUT tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PutState {
    /// Created, nothing written yet
    Idle,
    /// A segment is in flight
    Writing,
    /// The last segment failed; the next `start` is counted as a retry.
    /// This is the post-failure state of the lifecycle (`Failed`).
    RetryPending,
    /// The last segment was stored
    PartComplete,
    /// Terminal; every further call is ignored
    Finished,
}

/// Transient counters published while the request is in flight.
struct PutCounters {
    bytes_written: Arc<CounterCell>,
    errors: Arc<CounterCell>,
    retries: Arc<CounterCell>,
    time_spent: Arc<CounterCell>,
    error_time: Arc<CounterCell>,
    parts: Arc<CounterCell>,
    slice: Arc<ElapsedCounter>,
}

impl PutCounters {
    fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bytes_written: Arc::new(CounterCell::new()),
            errors: Arc::new(CounterCell::new()),
            retries: Arc::new(CounterCell::new()),
            time_spent: Arc::new(CounterCell::new()),
            error_time: Arc::new(CounterCell::new()),
            parts: Arc::new(CounterCell::new()),
            slice: Arc::new(ElapsedCounter::new(clock)),
        }
    }

    fn entries(&self) -> Vec<(&'static str, Arc<dyn Counter>)> {
        vec![
            (PutMetric::BytesWritten.name(), self.bytes_written.clone() as Arc<dyn Counter>),
            (PutMetric::Errors.name(), self.errors.clone() as Arc<dyn Counter>),
            (PutMetric::Retries.name(), self.retries.clone() as Arc<dyn Counter>),
            (PutMetric::TimeSpent.name(), self.time_spent.clone() as Arc<dyn Counter>),
            (PutMetric::ErrorTime.name(), self.error_time.clone() as Arc<dyn Counter>),
            (PutMetric::SliceTime.name(), self.slice.clone() as Arc<dyn Counter>),
            (PutMetric::Parts.name(), self.parts.clone() as Arc<dyn Counter>),
        ]
    }
}

/// State machine for one PUT request.
pub struct PutTracker {
    request_id: String,
    key: TenantKey,
    aggregate: Arc<PersistentAggregate>,
    policy: PersistedTimePolicy,
    counters: PutCounters,
    transient: TransientCounters,

    /// Stream offset where the in-flight segment starts
    current_position: u64,
    /// Size of the in-flight segment
    bytes_writing: u64,
    /// Bytes stored in the part still open
    part_bytes: u64,
    /// Bytes stored in closed parts
    persisted_bytes: u64,
    time_spent: u64,
    error_time: u64,
    parts: u64,

    writing: bool,
    retry_expected: bool,
    end_of_input: bool,
    finished: bool,
}

impl PutTracker {
    pub(crate) fn new(seed: TrackerSeed, policy: PersistedTimePolicy) -> Self {
        let TrackerSeed { request_id, key, aggregate, directory, clock, scope } = seed;

        aggregate.inc_ongoing_puts();

        let counters = PutCounters::new(clock);
        let prefix = naming::request_prefix(&scope, &key, &request_id);
        let transient = TransientCounters::register(directory, &prefix, counters.entries());

        debug!(request_id = %request_id, key = %key, "put tracker created");

        Self {
            request_id,
            key,
            aggregate,
            policy,
            counters,
            transient,
            current_position: 0,
            bytes_writing: 0,
            part_bytes: 0,
            persisted_bytes: 0,
            time_spent: 0,
            error_time: 0,
            parts: 0,
            writing: false,
            retry_expected: false,
            end_of_input: false,
            finished: false,
        }
    }

    /// A segment of `expected_bytes` was handed to the transport.
    ///
    /// If the previous segment failed this counts as one retry.
    pub fn start(&mut self, expected_bytes: u64) {
        if self.ignored("start") {
            return;
        }
        if self.writing {
            debug!(
                request_id = %self.request_id,
                abandoned = self.bytes_writing,
                "segment restarted before its boundary"
            );
        }

        self.writing = true;
        self.bytes_writing = expected_bytes;
        self.counters.slice.restart();

        if self.retry_expected {
            self.retry_expected = false;
            self.counters.retries.inc();
            self.aggregate.inc_put_retries();
        }

        debug!(
            request_id = %self.request_id,
            position = self.current_position,
            bytes = expected_bytes,
            "put segment started"
        );
    }

    /// The stream was repositioned to `next_position`.
    ///
    /// Ignored unless a segment is in flight.
    pub fn boundary_event(&mut self, next_position: u64) {
        if self.ignored("boundary_event") || !self.writing {
            return;
        }

        let expected = self.segment_end();
        if next_position == expected {
            self.fold_segment(true);
            self.close_part();
            return;
        }

        // Resumed inside the segment, past bytes the transport already stored.
        let acknowledged = if next_position < expected {
            next_position.saturating_sub(self.current_position)
        } else {
            0
        };
        self.fold_segment(false);
        if acknowledged > 0 {
            self.credit(acknowledged);
        }

        debug!(
            request_id = %self.request_id,
            expected,
            next_position,
            acknowledged,
            "put segment failed, retry expected"
        );
        self.current_position = next_position;
        self.retry_expected = true;
    }

    /// The input stream is exhausted; an in-flight segment counts as stored.
    pub fn end_of_input(&mut self) {
        if self.ignored("end_of_input") {
            return;
        }
        if self.writing {
            self.fold_segment(true);
        }
        self.end_of_input = true;
    }

    /// Record the request outcome.
    ///
    /// Only the first call has an effect; it returns `true`.
    pub fn complete(&mut self, outcome: RequestOutcome) -> bool {
        if self.finished {
            debug!(request_id = %self.request_id, ?outcome, "put already completed");
            return false;
        }

        match outcome {
            RequestOutcome::Succeeded => {
                if self.writing {
                    self.fold_segment(true);
                    self.close_part();
                } else if self.part_bytes > 0 || (self.end_of_input && self.parts == 0) {
                    // An empty stream still stores one (empty) part.
                    self.close_part();
                }
                self.end_of_input = false;

                let persisted_time = match self.policy {
                    PersistedTimePolicy::ExcludeRetries => self.time_spent,
                    PersistedTimePolicy::IncludeRetries => {
                        self.time_spent.saturating_add(self.error_time)
                    }
                };
                self.aggregate.add_persisted_bytes_up(self.persisted_bytes);
                self.aggregate.inc_successful_puts();
                self.aggregate.add_parts_persisted(self.parts);
                self.aggregate.add_persisted_put_time(persisted_time);
                self.aggregate.add_put_throughput_sample(self.persisted_bytes, persisted_time);
            }
            RequestOutcome::Failed => {
                if self.writing {
                    self.fold_segment(false);
                }
                self.aggregate.inc_failed_puts();
            }
        }

        self.aggregate.dec_ongoing_puts();
        self.transient.deregister();
        self.finished = true;

        debug!(
            request_id = %self.request_id,
            key = %self.key,
            ?outcome,
            persisted_bytes = self.persisted_bytes,
            parts = self.parts,
            "put completed"
        );
        true
    }

    pub fn succeed(&mut self) -> bool {
        self.complete(RequestOutcome::Succeeded)
    }

    pub fn fail(&mut self) -> bool {
        self.complete(RequestOutcome::Failed)
    }

    pub fn state(&self) -> PutState {
        if self.finished {
            PutState::Finished
        } else if self.writing {
            PutState::Writing
        } else if self.retry_expected {
            PutState::RetryPending
        } else if self.parts > 0 || self.part_bytes > 0 || self.end_of_input {
            PutState::PartComplete
        } else {
            PutState::Idle
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn key(&self) -> &TenantKey {
        &self.key
    }

    /// Stream offset where the next segment starts.
    pub fn position(&self) -> u64 {
        self.current_position
    }

    /// Bytes stored so far, including the part still open.
    pub fn persisted_bytes(&self) -> u64 {
        self.persisted_bytes.saturating_add(self.part_bytes)
    }

    /// Full names of the transient counters still published.
    pub fn counter_names(&self) -> &[String] {
        self.transient.names()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ignored(&self, call: &'static str) -> bool {
        if self.finished {
            debug!(request_id = %self.request_id, call, "put already completed, call ignored");
        }
        self.finished
    }

    /// Stream offset just past the in-flight segment.
    fn segment_end(&self) -> u64 {
        self.current_position.checked_add(self.bytes_writing).unwrap_or_else(|| {
            warn!(
                request_id = %self.request_id,
                position = self.current_position,
                bytes = self.bytes_writing,
                "segment end overflows the stream position, saturating"
            );
            u64::MAX
        })
    }

    /// Close the in-flight segment as stored or failed.
    fn fold_segment(&mut self, success: bool) {
        self.writing = false;
        let slice = self.counters.slice.elapsed_millis();

        if success {
            self.current_position = self.segment_end();
            self.credit(self.bytes_writing);
            self.time_spent = self.time_spent.saturating_add(slice);
            self.counters.time_spent.add(to_i64(slice));
            self.aggregate.add_put_time(slice);
        } else {
            self.error_time = self.error_time.saturating_add(slice);
            self.counters.errors.inc();
            self.counters.error_time.add(to_i64(slice));
            self.aggregate.inc_part_errors();
            self.aggregate.add_part_errors_time(slice);
        }
        self.bytes_writing = 0;
    }

    fn credit(&mut self, bytes: u64) {
        self.part_bytes = self.part_bytes.saturating_add(bytes);
        self.counters.bytes_written.add(to_i64(bytes));
        self.aggregate.add_bytes_up(bytes);
    }

    fn close_part(&mut self) {
        self.parts = self.parts.saturating_add(1);
        self.counters.parts.inc();
        self.aggregate.inc_parts_put();
        self.persisted_bytes = self.persisted_bytes.saturating_add(self.part_bytes);
        self.part_bytes = 0;
    }
}

impl fmt::Debug for PutTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutTracker")
            .field("request_id", &self.request_id)
            .field("key", &self.key)
            .field("state", &self.state())
            .field("position", &self.current_position)
            .field("persisted_bytes", &self.persisted_bytes())
            .finish_non_exhaustive()
    }
}

impl Drop for PutTracker {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                request_id = %self.request_id,
                key = %self.key,
                "put tracker dropped without completion, recording failure"
            );
            self.complete(RequestOutcome::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use blobmeter_common::MockClock;
    use blobmeter_domain::AggregateMetric;

    use super::*;
    use crate::context::MeterContext;

    fn context() -> (MockClock, MeterContext) {
        let clock = MockClock::new();
        let context = MeterContext::builder().clock(Arc::new(clock.clone())).build().unwrap();
        (clock, context)
    }

    #[test]
    fn state_follows_lifecycle() {
        let (_, context) = context();
        let mut put = context.put_tracker(None);
        assert_eq!(put.state(), PutState::Idle);

        put.start(10);
        assert_eq!(put.state(), PutState::Writing);
        put.boundary_event(10);
        assert_eq!(put.state(), PutState::PartComplete);

        put.start(10);
        put.boundary_event(12);
        assert_eq!(put.state(), PutState::RetryPending);

        put.start(8);
        assert_eq!(put.state(), PutState::Writing);
        put.end_of_input();
        assert_eq!(put.state(), PutState::PartComplete);

        assert!(put.succeed());
        assert_eq!(put.state(), PutState::Finished);
        assert_eq!(put.persisted_bytes(), 20);
    }

    #[test]
    fn end_of_input_after_closed_part_adds_no_part() {
        let (_, context) = context();
        let mut put = context.put_tracker(None);

        put.start(10);
        put.boundary_event(10);
        put.end_of_input();
        put.succeed();

        let aggregate = context.aggregate(context.default_key());
        assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 1);
        assert_eq!(aggregate.read(AggregateMetric::PartsPut), 1);
        assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 10);
    }

    #[test]
    fn empty_stream_stores_one_part() {
        let (_, context) = context();
        let mut put = context.put_tracker(None);

        put.end_of_input();
        assert_eq!(put.state(), PutState::PartComplete);
        put.succeed();

        let aggregate = context.aggregate(context.default_key());
        assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 1);
        assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 0);
        assert_eq!(aggregate.read(AggregateMetric::SuccessfulPuts), 1);
    }

    #[test]
    fn position_past_segment_credits_nothing() {
        let (clock, context) = context();
        let mut put = context.put_tracker(None);

        put.start(100);
        clock.advance_millis(20);
        put.boundary_event(150);

        assert_eq!(put.persisted_bytes(), 0);
        assert_eq!(put.position(), 150);
        assert_eq!(put.state(), PutState::RetryPending);

        let aggregate = context.aggregate(context.default_key());
        assert_eq!(aggregate.read(AggregateMetric::BytesUp), 0);
        assert_eq!(aggregate.read(AggregateMetric::PartErrors), 1);
        assert_eq!(aggregate.read(AggregateMetric::PartErrorsTime), 20);
        put.fail();
    }

    #[test]
    fn positions_near_u64_max_saturate() {
        let (_, context) = context();
        let mut put = context.put_tracker(None);

        put.start(10);
        put.boundary_event(u64::MAX - 5);
        put.start(10);
        put.boundary_event(u64::MAX);
        assert_eq!(put.position(), u64::MAX);
        assert_eq!(put.persisted_bytes(), 10);

        put.start(10);
        put.boundary_event(0);
        assert_eq!(put.position(), 0);
        assert_eq!(put.persisted_bytes(), 10);
        assert!(put.succeed());

        let aggregate = context.aggregate(context.default_key());
        assert_eq!(aggregate.read(AggregateMetric::PartErrors), 2);
        assert_eq!(aggregate.read(AggregateMetric::PutRetries), 1);
        assert_eq!(aggregate.read(AggregateMetric::PersistedBytesUp), 10);
        assert_eq!(aggregate.read(AggregateMetric::PartsPersisted), 1);
        assert_eq!(aggregate.read(AggregateMetric::OngoingPuts), 0);
    }
}
