//! Time abstractions
//!
//! Segment timers in the metering engine read time through the [`Clock`]
//! trait so that tests can drive elapsed time deterministically with
//! [`MockClock`] instead of sleeping.
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use std::time::Duration;
//!
//! use blobmeter_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_millis(250));
//! assert_eq!(clock.millis_since(start), 250);
//! # }
//! ```

pub mod clock;

// Re-export commonly used items
pub use clock::{Clock, MockClock, SystemClock};
