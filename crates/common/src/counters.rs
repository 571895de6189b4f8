//! Counter primitives backing every named metric.
//!
//! Directory entries are trait objects implementing [`Counter`]. Three
//! flavours exist:
//!
//! - [`CounterCell`]: a plain atomic value (monotonic totals and gauges)
//! - [`ElapsedCounter`]: reads as the milliseconds since it was (re)started
//! - [`ThroughputCounter`]: reads as bytes per second over accumulated samples
//!
//! All updates use relaxed atomics or a short `parking_lot` critical section.
//! No ordering is implied between two different counters.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::time::Clock;

/// A readable counter value.
pub trait Counter: Send + Sync + fmt::Debug {
    /// Current value of the counter.
    fn value(&self) -> i64;
}

/// Lock-free signed counter.
#[derive(Debug, Default)]
pub struct CounterCell {
    value: AtomicI64,
}

impl CounterCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell with an initial value.
    pub fn with_value(value: i64) -> Self {
        Self { value: AtomicI64::new(value) }
    }

    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    #[inline]
    pub fn dec(&self) {
        self.sub(1);
    }

    #[inline]
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn sub(&self, delta: i64) {
        self.value.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Overwrite the value.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Raise the value to `candidate` if it is larger. Returns the previous value.
    pub fn fetch_max(&self, candidate: i64) -> i64 {
        self.value.fetch_max(candidate, Ordering::Relaxed)
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Counter for CounterCell {
    fn value(&self) -> i64 {
        self.get()
    }
}

/// Reads as the whole milliseconds elapsed since the counter was started.
///
/// Used for the per-request "time spent this slice" entries so a reader can
/// see how long the current segment has been active.
pub struct ElapsedCounter {
    clock: Arc<dyn Clock>,
    start: Mutex<Instant>,
}

impl ElapsedCounter {
    /// Start counting from the clock's current instant.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self { clock, start: Mutex::new(start) }
    }

    /// Reset the start point to now.
    pub fn restart(&self) {
        *self.start.lock() = self.clock.now();
    }

    pub fn elapsed_millis(&self) -> u64 {
        let start = *self.start.lock();
        self.clock.millis_since(start)
    }
}

impl fmt::Debug for ElapsedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElapsedCounter").field("elapsed_ms", &self.elapsed_millis()).finish()
    }
}

impl Counter for ElapsedCounter {
    fn value(&self) -> i64 {
        i64::try_from(self.elapsed_millis()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ThroughputSamples {
    bytes: u64,
    millis: u64,
}

/// Bytes-per-second throughput over every sample added so far.
///
/// Bytes and time are updated together under one lock so a reader never
/// sees bytes from one sample paired with the time of another.
#[derive(Debug, Default)]
pub struct ThroughputCounter {
    samples: Mutex<ThroughputSamples>,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transfer of `bytes` that took `millis` milliseconds.
    pub fn add_data_point(&self, bytes: u64, millis: u64) {
        let mut samples = self.samples.lock();
        samples.bytes = samples.bytes.saturating_add(bytes);
        samples.millis = samples.millis.saturating_add(millis);
    }

    /// Add time without bytes (time spent on failed attempts).
    pub fn add_time(&self, millis: u64) {
        let mut samples = self.samples.lock();
        samples.millis = samples.millis.saturating_add(millis);
    }

    /// Accumulated `(bytes, millis)`.
    pub fn totals(&self) -> (u64, u64) {
        let samples = *self.samples.lock();
        (samples.bytes, samples.millis)
    }

    /// Bytes per second; zero accumulated time counts as one second.
    pub fn bytes_per_second(&self) -> u64 {
        let (bytes, millis) = self.totals();
        if millis == 0 {
            return bytes;
        }
        let rate = u128::from(bytes) * 1000 / u128::from(millis);
        u64::try_from(rate).unwrap_or(u64::MAX)
    }
}

impl Counter for ThroughputCounter {
    fn value(&self) -> i64 {
        i64::try_from(self.bytes_per_second()).unwrap_or(i64::MAX)
    }
}
