use tracing::{info, warn};

use crate::simulation::TransferSummary;

/// Log the outcome of a simulated transfer with structured fields.
#[inline]
pub fn log_transfer(summary: &TransferSummary) {
    let provider = summary.provider.label();
    let duration_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX);
    let scenario = summary.scenario.as_str();

    if summary.succeeded {
        info!(
            provider,
            operation = %summary.operation,
            request_id = %summary.request_id,
            scenario,
            bytes = summary.bytes,
            duration_ms,
            "transfer_success"
        );
    } else {
        warn!(
            provider,
            operation = %summary.operation,
            request_id = %summary.request_id,
            scenario,
            duration_ms,
            "transfer_failure"
        );
    }
}

/// Log a console line that did not parse.
#[inline]
pub fn log_rejected_input(stage: &str, error: &dyn std::error::Error) {
    warn!(stage, error = %error, "console_input_rejected");
}
