// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-agnostic token usage extraction.
//!
//! Responses arrive in whatever shape the provider SDK produced. Rather than
//! asking callers which provider answered, the normalizer searches a fixed,
//! ordered list of usage container names and token field names covering the
//! OpenAI, Anthropic, and Gemini vocabularies. First match wins; anything
//! missing counts as zero. Normalization never fails.

use serde::Serialize;
use serde_json::{Map, Value};
use tally_core::UsageRecord;
use tracing::debug;

/// Usage container names, in lookup order. Some providers expose more than one.
pub const USAGE_CONTAINERS: &[&str] = &["usage", "usage_metadata", "usageMetadata"];

/// Prompt-token field names, in lookup order.
pub const PROMPT_TOKEN_FIELDS: &[&str] = &[
    "prompt_tokens",
    "input_tokens",
    "prompt_token_count",
    "promptTokenCount",
    "inputTokens",
];

/// Completion-token field names, in lookup order.
pub const COMPLETION_TOKEN_FIELDS: &[&str] = &[
    "completion_tokens",
    "output_tokens",
    "candidates_token_count",
    "candidatesTokenCount",
    "outputTokens",
];

/// Extract token usage from a JSON response value.
///
/// Returns `UsageRecord::default()` when no usage container is present.
pub fn usage_from_value(response: &Value) -> UsageRecord {
    let Some(container) = usage_container(response) else {
        return UsageRecord::default();
    };

    UsageRecord {
        prompt_tokens: first_count(container, PROMPT_TOKEN_FIELDS),
        completion_tokens: first_count(container, COMPLETION_TOKEN_FIELDS),
    }
}

/// Extract token usage from any serializable response type.
///
/// The response is serialized to JSON first; a response that fails to
/// serialize yields zero usage rather than an error.
pub fn usage_from<T: Serialize + ?Sized>(response: &T) -> UsageRecord {
    match serde_json::to_value(response) {
        Ok(value) => usage_from_value(&value),
        Err(e) => {
            debug!(error = %e, "response could not be serialized; assuming zero usage");
            UsageRecord::default()
        }
    }
}

/// First usage container that is a non-empty object.
fn usage_container(response: &Value) -> Option<&Map<String, Value>> {
    let object = response.as_object()?;
    USAGE_CONTAINERS
        .iter()
        .filter_map(|name| object.get(*name)?.as_object())
        .find(|container| !container.is_empty())
}

/// First candidate field holding a non-negative integer, or 0.
fn first_count(container: &Map<String, Value>, candidates: &[&str]) -> u64 {
    candidates
        .iter()
        .find_map(|name| container.get(*name)?.as_u64())
        .unwrap_or(0)
}
