//! Per-request trackers
//!
//! A tracker is created for each in-flight request, driven by that
//! request's single thread of control through `&mut self` calls, and folds
//! its totals into its aggregate exactly once on the first terminal call.
//! A tracker dropped before that call completes itself as a failure.

mod get;
mod put;

use std::sync::Arc;

use blobmeter_common::Clock;
use blobmeter_domain::TenantKey;

pub use get::{GetState, GetTracker};
pub use put::{PutState, PutTracker};

use crate::aggregate::PersistentAggregate;
use crate::directory::CounterDirectory;

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    Succeeded,
    Failed,
}

impl RequestOutcome {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl From<bool> for RequestOutcome {
    fn from(success: bool) -> Self {
        if success {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// Everything a tracker needs from its context at creation.
#[derive(Debug)]
pub(crate) struct TrackerSeed {
    pub(crate) request_id: String,
    pub(crate) key: TenantKey,
    pub(crate) aggregate: Arc<PersistentAggregate>,
    pub(crate) directory: Arc<dyn CounterDirectory>,
    pub(crate) clock: Arc<dyn Clock>,
    /// Scope prefix of the transient counters
    pub(crate) scope: String,
}
