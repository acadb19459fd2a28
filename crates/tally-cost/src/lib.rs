// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost attribution for LLM calls.
//!
//! This crate provides:
//! - **Usage normalizer**: Provider-agnostic prompt/completion token extraction
//! - **Pricing**: Provider family resolution and fail-closed rate lookup
//! - **Ledger**: Concurrency-safe per-model cost and token accounting
//! - **Interceptor**: Blocking and async wrappers that record every successful call

pub mod interceptor;
pub mod ledger;
pub mod normalize;
pub mod pricing;
pub mod recording;

pub use interceptor::{
    Caller, CostEntry, CostTracker, LedgerScope, ModelHandle, Tracked, TrackedAsync,
};
pub use ledger::{Ledger, LedgerSnapshot, TokenLog};
pub use tally_core::{ModelRate, PriceTable, ProviderFamily, TallyError, UsageRecord};
