//! Counter naming convention
//!
//! `<scope>.<tenant key parts>.[<request id>.]<metric name>`. The request
//! id segment appears only on per-request counters.

use blobmeter_domain::constants::{NAME_SEPARATOR, REQUEST_ID_SEPARATOR};
use blobmeter_domain::TenantKey;

/// Prefix shared by every counter of one aggregate: `<scope>.<key>`.
pub fn aggregate_prefix(scope: &str, key: &TenantKey) -> String {
    format!("{scope}{NAME_SEPARATOR}{key}")
}

/// Prefix shared by every counter of one request: `<scope>.<key>.<request id>`.
pub fn request_prefix(scope: &str, key: &TenantKey, request_id: &str) -> String {
    format!("{scope}{NAME_SEPARATOR}{key}{NAME_SEPARATOR}{request_id}")
}

/// Append a metric name to a prefix.
pub fn counter_name(prefix: &str, metric: &str) -> String {
    format!("{prefix}{NAME_SEPARATOR}{metric}")
}

/// Request id for sequence number `seq`: `<secondary>-<seq>` for two-part
/// keys, `<seq>` otherwise.
pub fn request_id(key: &TenantKey, seq: u64) -> String {
    match key.secondary() {
        Some(secondary) => format!("{secondary}{REQUEST_ID_SEPARATOR}{seq}"),
        None => seq.to_string(),
    }
}
