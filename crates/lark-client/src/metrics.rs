//! Request metrics
//!
//! Emitted through the `metrics` facade; the embedding application decides
//! whether and how to export them.
//!
//! - `lark_requests_total` (counter): labels `kind`, `method`, `outcome`
//! - `lark_request_duration_seconds` (histogram): label `kind`

use crate::error::Result;

/// Request kind label for JSON calls
pub const KIND_JSON: &str = "json";

/// Request kind label for multipart uploads
pub const KIND_UPLOAD: &str = "upload";

/// Record one finished call.
pub fn record_request<T>(kind: &'static str, method: &str, result: &Result<T>, duration_secs: f64) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::counter!(
        "lark_requests_total",
        "kind" => kind,
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("lark_request_duration_seconds", "kind" => kind).record(duration_secs);
}
