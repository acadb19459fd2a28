// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder can collect these.
//! Without a recorder every call is a no-op.

use metrics::{describe_counter, describe_histogram};
use tally_core::{ProviderFamily, UsageRecord};

use crate::interceptor::LedgerScope;

/// Register all Tally metric descriptions.
///
/// Call once at startup after a recorder is installed.
pub fn register_metrics() {
    describe_counter!("tally_calls_total", "Model calls recorded in a ledger");
    describe_counter!("tally_tokens_total", "Tokens recorded across all ledgers");
    describe_counter!(
        "tally_rejected_calls_total",
        "Calls that completed but could not be priced"
    );
    describe_histogram!(
        "tally_call_cost_usd",
        "Cost of a single recorded call in USD"
    );
}

/// Record one priced call.
pub fn record_call(
    model: &str,
    family: ProviderFamily,
    scope: LedgerScope,
    usage: &UsageRecord,
    cost_usd: f64,
) {
    let family: &'static str = family.into();
    let scope: &'static str = scope.into();
    metrics::counter!(
        "tally_calls_total",
        "model" => model.to_string(),
        "family" => family,
        "scope" => scope
    )
    .increment(1);
    metrics::counter!("tally_tokens_total", "model" => model.to_string(), "type" => "prompt")
        .increment(usage.prompt_tokens);
    metrics::counter!("tally_tokens_total", "model" => model.to_string(), "type" => "completion")
        .increment(usage.completion_tokens);
    metrics::histogram!("tally_call_cost_usd", "model" => model.to_string())
        .record(cost_usd);
}

/// Record a call that failed closed, labelled by the reason.
pub fn record_rejected(reason: &'static str) {
    metrics::counter!("tally_rejected_calls_total", "reason" => reason)
        .increment(1);
}
