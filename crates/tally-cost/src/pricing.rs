// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider family resolution, rate lookup, and cost calculation.
//!
//! Rates are USD per token. Every cost that leaves this module is rounded to
//! six decimal places (micro-dollars).

use serde::Serialize;
use tally_core::{ModelRate, PriceTable, ProviderFamily, TallyError, UsageRecord};

use crate::normalize;

/// Family markers, checked in order. The first rule with a matching marker wins.
const FAMILY_RULES: &[(ProviderFamily, &[&str])] = &[
    (ProviderFamily::OpenAi, &["gpt", "o1", "o3", "o4"]),
    (ProviderFamily::Anthropic, &["claude"]),
    (ProviderFamily::Google, &["gemini"]),
];

/// Classify a model identifier into its provider family.
///
/// Matching is a case-insensitive substring test. An identifier carrying
/// markers of two families resolves to the earlier rule (`openai`, then
/// `anthropic`, then `google`).
pub fn provider_family(model: &str) -> Result<ProviderFamily, TallyError> {
    let lower = model.to_lowercase();
    FAMILY_RULES
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| lower.contains(m)))
        .map(|(family, _)| *family)
        .ok_or_else(|| TallyError::UnsupportedProvider {
            model: model.to_string(),
        })
}

/// Resolve the family and rate for a model, failing closed on either miss.
pub fn lookup(table: &PriceTable, model: &str) -> Result<(ProviderFamily, ModelRate), TallyError> {
    let family = provider_family(model)?;
    let rate = table
        .get(family, model)
        .ok_or_else(|| TallyError::UnknownModelPricing {
            family: family.to_string(),
            model: model.to_string(),
        })?;
    Ok((family, *rate))
}

/// Cost in USD of the given usage at the given rate, rounded to 6 places.
pub fn calculate_cost(usage: &UsageRecord, rate: &ModelRate) -> f64 {
    let prompt = usage.prompt_tokens as f64 * rate.prompt;
    let completion = usage.completion_tokens as f64 * rate.completion;
    round_usd(prompt + completion)
}

/// Round a USD amount to six decimal places.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 1_000_000.0).round() / 1_000_000.0
}

/// Normalize a single response and price it, without touching any ledger.
pub fn price_response<T: Serialize + ?Sized>(response: &T, rate: &ModelRate) -> (UsageRecord, f64) {
    let usage = normalize::usage_from(response);
    let cost = calculate_cost(&usage, rate);
    (usage, cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> PriceTable {
        PriceTable::new()
            .with_rate(
                ProviderFamily::OpenAi,
                "gpt-4.1",
                ModelRate::new(0.000002, 0.000008),
            )
            .with_rate(
                ProviderFamily::Anthropic,
                "claude-3-opus",
                ModelRate::per_million(15.0, 75.0),
            )
    }

    #[test]
    fn resolves_documented_families() {
        assert_eq!(
            provider_family("claude-3-opus").unwrap(),
            ProviderFamily::Anthropic
        );
        assert_eq!(
            provider_family("gemini-1.5-pro").unwrap(),
            ProviderFamily::Google
        );
        assert_eq!(provider_family("gpt-4o").unwrap(), ProviderFamily::OpenAi);
        assert_eq!(provider_family("o1-mini").unwrap(), ProviderFamily::OpenAi);
        assert_eq!(provider_family("o3").unwrap(), ProviderFamily::OpenAi);
        assert_eq!(provider_family("o4-mini").unwrap(), ProviderFamily::OpenAi);
    }

    #[test]
    fn resolution_is_case_insensitive() {
        assert_eq!(provider_family("GPT-4o").unwrap(), ProviderFamily::OpenAi);
        assert_eq!(
            provider_family("Claude-3-Haiku").unwrap(),
            ProviderFamily::Anthropic
        );
        assert_eq!(
            provider_family("GEMINI-PRO").unwrap(),
            ProviderFamily::Google
        );
    }

    #[test]
    fn unknown_model_is_unsupported() {
        let err = provider_family("unknown-model-x").unwrap_err();
        assert!(matches!(
            err,
            TallyError::UnsupportedProvider { ref model } if model == "unknown-model-x"
        ));
    }

    #[test]
    fn earlier_rule_wins_on_marker_collision() {
        assert_eq!(
            provider_family("claude-gpt-bridge").unwrap(),
            ProviderFamily::OpenAi
        );
        assert_eq!(
            provider_family("gemini-claude-eval").unwrap(),
            ProviderFamily::Anthropic
        );
    }

    #[test]
    fn lookup_fails_closed_for_unpriced_model() {
        let err = lookup(&table(), "gpt-5-preview").unwrap_err();
        assert!(matches!(
            err,
            TallyError::UnknownModelPricing { ref family, ref model }
                if family == "openai" && model == "gpt-5-preview"
        ));
    }

    #[test]
    fn lookup_fails_closed_for_absent_family() {
        let err = lookup(&table(), "gemini-1.5-pro").unwrap_err();
        assert!(matches!(
            err,
            TallyError::UnknownModelPricing { ref family, .. } if family == "google"
        ));
    }

    #[test]
    fn lookup_returns_family_and_rate() {
        let (family, rate) = lookup(&table(), "claude-3-opus").unwrap();
        assert_eq!(family, ProviderFamily::Anthropic);
        assert!((rate.completion - 0.000075).abs() < 1e-15);
    }

    #[test]
    fn documented_cost_example() {
        let rate = ModelRate::new(0.000002, 0.000008);
        let cost = calculate_cost(&UsageRecord::new(100, 50), &rate);
        assert!((cost - 0.0006).abs() < 1e-12, "expected 0.0006, got {cost}");
    }

    #[test]
    fn cost_is_rounded_to_six_places() {
        let rate = ModelRate::new(0.0000001234, 0.0);
        let cost = calculate_cost(&UsageRecord::new(7, 0), &rate);
        // 7 * 0.0000001234 = 0.0000008638
        assert!((cost - 0.000001).abs() < 1e-12, "got {cost}");
    }

    #[test]
    fn zero_tokens_zero_cost() {
        let rate = ModelRate::per_million(75.0, 150.0);
        let cost = calculate_cost(&UsageRecord::default(), &rate);
        assert!((cost - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_response_normalizes_then_prices() {
        let resp = json!({"usage": {"prompt_tokens": 1000, "completion_tokens": 500}});
        let (usage, cost) = price_response(&resp, &ModelRate::per_million(2.0, 8.0));
        assert_eq!(usage, UsageRecord::new(1000, 500));
        // 1000 * 2e-6 + 500 * 8e-6 = 0.002 + 0.004
        assert!((cost - 0.006).abs() < 1e-12);
    }
}
