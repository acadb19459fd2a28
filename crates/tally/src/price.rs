// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally price` command implementation.
//!
//! Replays a captured provider response through a tracked operation, so the
//! response is normalized, priced and recorded exactly as a live call would
//! be, then prints the resulting ledger entry.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tally_config::TallyConfig;
use tally_core::{TallyError, UsageRecord};
use tally_cost::{CostTracker, pricing};

/// Arguments for `tally price`.
#[derive(Debug)]
pub struct PriceArgs {
    pub model: String,
    pub response: Option<PathBuf>,
    pub index: usize,
    pub json: bool,
}

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct PriceReport {
    pub model: String,
    pub family: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost_usd: f64,
    pub total_cost_usd: f64,
}

/// Run the `tally price` command.
pub fn run_price(
    config: &TallyConfig,
    args: &PriceArgs,
    use_color: bool,
) -> Result<(), TallyError> {
    let raw = read_response(args.response.as_deref())?;
    let report = price_raw(config, &args.model, &raw, args.index)?;

    if args.json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| {
            TallyError::Internal(format!("failed to serialize price report: {e}"))
        })?;
        println!("{out}");
    } else {
        print_report(&report, use_color);
    }
    Ok(())
}

/// Parse and price one raw JSON response.
pub fn price_raw(
    config: &TallyConfig,
    model: &str,
    raw: &str,
    index: usize,
) -> Result<PriceReport, TallyError> {
    let response: Value = serde_json::from_str(raw).map_err(|e| {
        TallyError::Internal(format!("response is not valid JSON: {e}"))
    })?;

    let tracker = Arc::new(CostTracker::from_config(config));
    let replay = tracker
        .wrap(|_model: &str, response: Value| -> Result<Value, TallyError> {
            Ok(response)
        })
        .with_response_index(index);
    replay.call(model, response)?;

    let ledger = tracker.shared_ledger();
    let log = ledger.token_log(model);
    let cost_usd = ledger.costs(model).last().copied().unwrap_or_default();
    let usage = UsageRecord::new(
        log.prompt_tokens.last().copied().unwrap_or_default(),
        log.completion_tokens.last().copied().unwrap_or_default(),
    );

    Ok(PriceReport {
        model: model.to_string(),
        family: pricing::provider_family(model)?.to_string(),
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens(),
        cost_usd,
        total_cost_usd: tracker.total_cost(None),
    })
}

fn read_response(path: Option<&Path>) -> Result<String, TallyError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            TallyError::Internal(format!("failed to read {}: {e}", path.display()))
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| TallyError::Internal(format!("cannot read stdin: {e}")))?;
            Ok(buf)
        }
    }
}

fn print_report(report: &PriceReport, use_color: bool) {
    println!();
    println!("  tally price");
    println!("  {}", "-".repeat(35));
    println!("    Model:       {} ({})", report.model, report.family);
    println!(
        "    Tokens:      {} prompt / {} completion ({} total)",
        report.prompt_tokens, report.completion_tokens, report.total_tokens
    );

    let cost = format!("${:.6}", report.cost_usd);
    if use_color {
        use colored::Colorize;
        println!("    Cost:        {}", cost.green());
    } else {
        println!("    Cost:        {cost}");
    }
    println!("    Total:       ${:.6}", report.total_cost_usd);
    println!();
}
