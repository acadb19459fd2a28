// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory cost ledger keyed by model identifier.
//!
//! For every model the ledger keeps an append-only list of per-call costs and
//! two index-aligned lists of prompt and completion token counts. Both maps
//! live behind one mutex, so a cost and its token counts are always appended
//! together and readers never observe lists of unequal length.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tally_core::UsageRecord;

use crate::pricing::round_usd;

/// Append-only token counts for one model, index-aligned with its costs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLog {
    pub prompt_tokens: Vec<u64>,
    pub completion_tokens: Vec<u64>,
}

/// A point-in-time copy of a ledger's contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub costs: HashMap<String, Vec<f64>>,
    pub token_logs: HashMap<String, TokenLog>,
}

impl LedgerSnapshot {
    /// Rounded sum of every cost in the snapshot.
    pub fn total_cost(&self) -> f64 {
        round_usd(self.costs.values().flatten().sum())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    costs: HashMap<String, Vec<f64>>,
    token_logs: HashMap<String, TokenLog>,
}

/// Accumulated per-model costs and token counts.
///
/// A ledger is either owned by a [`CostTracker`](crate::CostTracker) (the
/// shared ledger) or by an individual caller that exposes it through
/// [`Caller::ledger`](crate::Caller::ledger).
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one call's cost and token counts for `model`.
    pub fn append(&self, model: &str, usage: &UsageRecord, cost_usd: f64) {
        let mut state = self.lock();
        let costs = state.costs.entry(model.to_string()).or_default();
        costs.push(cost_usd);
        let log = state.token_logs.entry(model.to_string()).or_default();
        log.prompt_tokens.push(usage.prompt_tokens);
        log.completion_tokens.push(usage.completion_tokens);
    }

    /// Recorded costs for `model`, oldest first.
    pub fn costs(&self, model: &str) -> Vec<f64> {
        self.lock().costs.get(model).cloned().unwrap_or_default()
    }

    /// Recorded token counts for `model`.
    pub fn token_log(&self, model: &str) -> TokenLog {
        self.lock()
            .token_logs
            .get(model)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of calls recorded for `model`.
    pub fn len(&self, model: &str) -> usize {
        self.lock().costs.get(model).map_or(0, Vec::len)
    }

    /// Whether no call has been recorded for any model.
    pub fn is_empty(&self) -> bool {
        self.lock().costs.is_empty()
    }

    /// Models with at least one recorded call, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.lock().costs.keys().cloned().collect();
        models.sort();
        models
    }

    /// Rounded sum of every recorded cost across all models.
    pub fn total_cost(&self) -> f64 {
        round_usd(self.lock().costs.values().flatten().sum())
    }

    /// Copy both maps out under a single lock.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            costs: state.costs.clone(),
            token_logs: state.token_logs.clone(),
        }
    }

    // Appends complete before the guard drops, so a poisoned lock still
    // guards consistent data.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_lists_aligned() {
        let ledger = Ledger::new();
        ledger.append("gpt-4o", &UsageRecord::new(10, 5), 0.0001);
        ledger.append("gpt-4o", &UsageRecord::new(20, 0), 0.00005);

        assert_eq!(ledger.len("gpt-4o"), 2);
        assert_eq!(ledger.costs("gpt-4o"), vec![0.0001, 0.00005]);
        let log = ledger.token_log("gpt-4o");
        assert_eq!(log.prompt_tokens, vec![10, 20]);
        assert_eq!(log.completion_tokens, vec![5, 0]);
    }

    #[test]
    fn models_are_kept_apart() {
        let ledger = Ledger::new();
        ledger.append("gpt-4o", &UsageRecord::new(1, 1), 0.1);
        ledger.append("o3", &UsageRecord::new(2, 2), 0.2);

        assert_eq!(ledger.models(), ["gpt-4o", "o3"]);
        assert_eq!(ledger.len("gpt-4o"), 1);
        assert_eq!(ledger.len("o3"), 1);
        assert_eq!(ledger.len("o1"), 0);
    }

    #[test]
    fn empty_ledger_totals_zero() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert!((ledger.total_cost() - 0.0).abs() < f64::EPSILON);
        assert!(ledger.costs("gpt-4o").is_empty());
        assert_eq!(ledger.token_log("gpt-4o"), TokenLog::default());
    }

    #[test]
    fn total_cost_is_rounded_sum() {
        let ledger = Ledger::new();
        ledger.append("gpt-4o", &UsageRecord::default(), 0.1);
        ledger.append("gpt-4o", &UsageRecord::default(), 0.2);
        ledger.append("o1", &UsageRecord::default(), 0.000_000_4);

        // 0.1 + 0.2 is not exactly 0.3 in binary; rounding absorbs the error.
        assert_eq!(ledger.total_cost(), 0.3);
    }

    #[test]
    fn snapshot_copies_both_maps() {
        let ledger = Ledger::new();
        ledger.append("claude-3-opus", &UsageRecord::new(3, 4), 0.5);
        let snap = ledger.snapshot();

        assert_eq!(snap.costs["claude-3-opus"], vec![0.5]);
        assert_eq!(snap.token_logs["claude-3-opus"].prompt_tokens, vec![3]);
        assert!((snap.total_cost() - 0.5).abs() < f64::EPSILON);

        ledger.append("claude-3-opus", &UsageRecord::new(1, 1), 0.5);
        assert_eq!(
            snap.costs["claude-3-opus"],
            vec![0.5],
            "snapshot is detached"
        );
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let ledger = Ledger::new();
        ledger.append("gpt-4o", &UsageRecord::new(100, 50), 0.00075);
        let json = serde_json::to_value(ledger.snapshot()).unwrap();
        assert_eq!(json["token_logs"]["gpt-4o"]["completion_tokens"][0], 50);
        assert_eq!(json["costs"]["gpt-4o"][0], 0.00075);
    }
}
