//! # Blobmeter Domain
//!
//! Domain types for the blob-storage gateway metering engine.
//!
//! This crate contains:
//! - `TenantKey`, the identifier selecting which aggregate a request feeds
//! - Counter name catalogues for aggregates and per-request counters
//! - The `CounterSet` descriptor choosing which aggregate counters exist
//! - Configuration structures and domain errors
//!
//! ## Architecture
//! - No dependencies on other Blobmeter crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod counter_set;
pub mod errors;
pub mod macros;
pub mod metrics;
pub mod tenant;

// Re-export commonly used items
pub use config::*;
pub use counter_set::CounterSet;
pub use errors::*;
pub use metrics::{AggregateMetric, CounterGroup, GetMetric, PutMetric};
pub use tenant::TenantKey;
