//! # Blobmeter Core
//!
//! The metrics lifecycle engine: per-tenant aggregates, the registry that
//! creates them, and the per-request trackers that fold I/O events into
//! them exactly once.
//!
//! This crate contains:
//! - The [`CounterDirectory`] port and an in-memory implementation
//! - [`PersistentAggregate`] and [`AggregateRegistry`]
//! - [`PutTracker`] and [`GetTracker`] state machines
//! - [`MeterContext`], the explicitly constructed owner of all of the above
//! - Reporting by [`MetricsOption`]
//!
//! ## Architecture Principles
//! - Only depends on `blobmeter-common` and `blobmeter-domain`
//! - No I/O: counters live in memory for the process lifetime
//! - Bookkeeping faults are logged and absorbed, never raised to callers

pub mod aggregate;
pub mod context;
pub mod directory;
pub mod error;
pub mod naming;
pub mod registry;
pub mod report;
pub mod tracker;

mod transient;

pub use aggregate::{AggregateSnapshot, PersistentAggregate};
pub use context::{MeterContext, MeterContextBuilder};
pub use directory::{CounterDirectory, InMemoryCounterDirectory};
pub use error::{MetricsError, MetricsResult};
pub use registry::AggregateRegistry;
pub use report::{MetricsOption, MetricsReport};
pub use tracker::{GetState, GetTracker, PutState, PutTracker, RequestOutcome};
