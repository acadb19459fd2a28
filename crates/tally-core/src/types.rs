// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the pricing, ledger, and configuration crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Token counts extracted from one provider response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Tokens billed at the prompt (input) rate.
    pub prompt_tokens: u64,
    /// Tokens billed at the completion (output) rate.
    pub completion_tokens: u64,
}

impl UsageRecord {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Sum of prompt and completion tokens.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A grouping of model identifiers that share one price table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderFamily {
    /// Every known family, in resolution order.
    pub const ALL: [ProviderFamily; 3] = [
        ProviderFamily::OpenAi,
        ProviderFamily::Anthropic,
        ProviderFamily::Google,
    ];

}

/// Per-token USD rates for a single model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelRate {
    /// Cost of one prompt token.
    pub prompt: f64,
    /// Cost of one completion token. Image models only carry a prompt rate.
    #[serde(default)]
    pub completion: f64,
}

impl ModelRate {
    pub fn new(prompt: f64, completion: f64) -> Self {
        Self { prompt, completion }
    }

    /// Build a rate from USD-per-million-token list prices.
    pub fn per_million(prompt: f64, completion: f64) -> Self {
        Self {
            prompt: prompt / 1_000_000.0,
            completion: completion / 1_000_000.0,
        }
    }
}

/// Price table keyed by provider family name, then by model identifier.
///
/// Family keys are kept as strings so that configuration validation can
/// report unknown families with a suggestion instead of a bare parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    families: BTreeMap<String, BTreeMap<String, ModelRate>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the rate for `model` under `family`.
    pub fn insert(&mut self, family: ProviderFamily, model: impl Into<String>, rate: ModelRate) {
        let name: &'static str = family.into();
        self.families
            .entry(name.to_string())
            .or_default()
            .insert(model.into(), rate);
    }

    /// Builder-style variant of [`PriceTable::insert`].
    pub fn with_rate(
        mut self,
        family: ProviderFamily,
        model: impl Into<String>,
        rate: ModelRate,
    ) -> Self {
        self.insert(family, model, rate);
        self
    }

    /// Rate for `model` within `family`, if both are present.
    pub fn get(&self, family: ProviderFamily, model: &str) -> Option<&ModelRate> {
        let name: &'static str = family.into();
        self.families.get(name)?.get(model)
    }

    /// All models priced under the given family name.
    pub fn family(&self, family: &str) -> Option<&BTreeMap<String, ModelRate>> {
        self.families.get(family)
    }

    /// Iterate over `(family name, models)` pairs in name order.
    pub fn families(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ModelRate>)> {
        self.families.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total number of priced models across all families.
    pub fn model_count(&self) -> usize {
        self.families.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.model_count() == 0
    }
}
