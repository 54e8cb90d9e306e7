//! Language model gateway and the operations built on it

pub mod client;
pub mod composer;
pub mod translator;

pub use client::{ChatClient, LanguageModel};

use sonoreport_core::ReportError;

/// Count a gateway call by operation and outcome
fn record_call<T>(operation: &'static str, result: &Result<T, ReportError>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    if let Err(err) = result {
        tracing::warn!(operation = operation, error = %err, "Gateway call failed");
    }
    metrics::counter!(
        "gateway_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
