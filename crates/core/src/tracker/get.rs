//! GET request tracker
//!
//! Reads arrive as slices: `start_read`, then either `bytes_read` or
//! `error`. A `start_read` following an error is a retry.

use std::fmt;
use std::sync::Arc;

use blobmeter_common::{Clock, Counter, CounterCell, ElapsedCounter};
use blobmeter_domain::{GetMetric, TenantKey};
use tracing::{debug, warn};

use super::{RequestOutcome, TrackerSeed};
use crate::aggregate::{to_i64, PersistentAggregate};
use crate::naming;
use crate::transient::TransientCounters;

/// Observable phase of a GET tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GetState {
    /// No slice in flight
    Idle,
    /// A slice is being read
    Reading,
    /// Terminal; every further call is ignored
    Finished,
}

struct GetCounters {
    bytes_read: Arc<CounterCell>,
    errors: Arc<CounterCell>,
    retries: Arc<CounterCell>,
    time_spent: Arc<CounterCell>,
    error_time: Arc<CounterCell>,
    slice: Arc<ElapsedCounter>,
}

impl GetCounters {
    fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bytes_read: Arc::new(CounterCell::new()),
            errors: Arc::new(CounterCell::new()),
            retries: Arc::new(CounterCell::new()),
            time_spent: Arc::new(CounterCell::new()),
            error_time: Arc::new(CounterCell::new()),
            slice: Arc::new(ElapsedCounter::new(clock)),
        }
    }

    fn entries(&self) -> Vec<(&'static str, Arc<dyn Counter>)> {
        vec![
            (GetMetric::BytesRead.name(), self.bytes_read.clone() as Arc<dyn Counter>),
            (GetMetric::Errors.name(), self.errors.clone() as Arc<dyn Counter>),
            (GetMetric::Retries.name(), self.retries.clone() as Arc<dyn Counter>),
            (GetMetric::TimeSpent.name(), self.time_spent.clone() as Arc<dyn Counter>),
            (GetMetric::ErrorTime.name(), self.error_time.clone() as Arc<dyn Counter>),
            (GetMetric::SliceTime.name(), self.slice.clone() as Arc<dyn Counter>),
        ]
    }
}

/// State machine for one GET request.
pub struct GetTracker {
    request_id: String,
    key: TenantKey,
    aggregate: Arc<PersistentAggregate>,
    counters: GetCounters,
    transient: TransientCounters,

    bytes_read: u64,
    /// Slice time of successful reads
    time_spent: u64,
    /// Slice time of failed reads
    error_time: u64,

    reading: bool,
    read_error: bool,
    finished: bool,
}

impl GetTracker {
    pub(crate) fn new(seed: TrackerSeed) -> Self {
        let TrackerSeed { request_id, key, aggregate, directory, clock, scope } = seed;

        aggregate.inc_ongoing_gets();

        let counters = GetCounters::new(clock);
        let prefix = naming::request_prefix(&scope, &key, &request_id);
        let transient = TransientCounters::register(directory, &prefix, counters.entries());

        debug!(request_id = %request_id, key = %key, "get tracker created");

        Self {
            request_id,
            key,
            aggregate,
            counters,
            transient,
            bytes_read: 0,
            time_spent: 0,
            error_time: 0,
            reading: false,
            read_error: false,
            finished: false,
        }
    }

    /// A read slice begins. After an error this counts as one retry.
    pub fn start_read(&mut self) {
        if self.ignored("start_read") {
            return;
        }
        if self.read_error {
            self.read_error = false;
            self.counters.retries.inc();
            self.aggregate.inc_get_retries();
        }
        self.reading = true;
        self.counters.slice.restart();
    }

    /// The current slice delivered `bytes`.
    pub fn bytes_read(&mut self, bytes: u64) {
        if self.ignored("bytes_read") {
            return;
        }
        let slice = self.counters.slice.elapsed_millis();
        self.reading = false;

        self.bytes_read = self.bytes_read.saturating_add(bytes);
        self.time_spent = self.time_spent.saturating_add(slice);
        self.counters.bytes_read.add(to_i64(bytes));
        self.counters.time_spent.add(to_i64(slice));
        self.aggregate.add_bytes_down(bytes);
        self.aggregate.add_get_data_time(slice);
    }

    /// The current slice failed.
    ///
    /// The error is counted even without a slice in flight, but only an
    /// error during a read makes the next `start_read` a retry.
    pub fn error(&mut self) {
        if self.ignored("error") {
            return;
        }
        let slice = self.counters.slice.elapsed_millis();
        if self.reading {
            self.read_error = true;
        }
        self.reading = false;

        self.error_time = self.error_time.saturating_add(slice);
        self.counters.errors.inc();
        self.counters.error_time.add(to_i64(slice));
        self.aggregate.inc_get_errors();
        self.aggregate.add_get_errors_time(slice);

        debug!(request_id = %self.request_id, slice_ms = slice, "get slice failed");
    }

    /// Record the request outcome.
    ///
    /// Only the first call has an effect; it returns `true`.
    pub fn complete(&mut self, outcome: RequestOutcome) -> bool {
        if self.finished {
            debug!(request_id = %self.request_id, ?outcome, "get already completed");
            return false;
        }

        match outcome {
            RequestOutcome::Succeeded => {
                self.aggregate.inc_successful_gets();
                self.aggregate.add_persisted_bytes_down(self.bytes_read);
                self.aggregate.add_persisted_get_time(self.time_spent);
                self.aggregate.add_get_throughput_sample(self.bytes_read, self.time_spent);
            }
            RequestOutcome::Failed => {
                if self.reading {
                    self.error();
                }
                // Time a failed request held the backend still counts against throughput.
                self.aggregate
                    .add_get_throughput_time(self.time_spent.saturating_add(self.error_time));
                self.aggregate.inc_failed_gets();
            }
        }

        self.aggregate.dec_ongoing_gets();
        self.transient.deregister();
        self.finished = true;

        debug!(
            request_id = %self.request_id,
            key = %self.key,
            ?outcome,
            bytes_read = self.bytes_read,
            "get completed"
        );
        true
    }

    pub fn succeed(&mut self) -> bool {
        self.complete(RequestOutcome::Succeeded)
    }

    pub fn fail(&mut self) -> bool {
        self.complete(RequestOutcome::Failed)
    }

    pub fn state(&self) -> GetState {
        if self.finished {
            GetState::Finished
        } else if self.reading {
            GetState::Reading
        } else {
            GetState::Idle
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn key(&self) -> &TenantKey {
        &self.key
    }

    pub fn total_bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn counter_names(&self) -> &[String] {
        self.transient.names()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ignored(&self, call: &'static str) -> bool {
        if self.finished {
            debug!(request_id = %self.request_id, call, "get already completed, call ignored");
        }
        self.finished
    }
}

impl fmt::Debug for GetTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetTracker")
            .field("request_id", &self.request_id)
            .field("key", &self.key)
            .field("state", &self.state())
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

impl Drop for GetTracker {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                request_id = %self.request_id,
                key = %self.key,
                "get tracker dropped without completion, recording failure"
            );
            self.complete(RequestOutcome::Failed);
        }
    }
}
