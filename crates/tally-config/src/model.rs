// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tally cost accounting layer.
//!
//! Config sections use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! keys at startup. The price table is an open map of families and models, so
//! its family names are checked during validation instead.

use serde::{Deserialize, Serialize};
use tally_core::{ModelRate, PriceTable, ProviderFamily};

/// Top-level Tally configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    /// Tracker behavior settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Per-token prices keyed by provider family, then model identifier.
    #[serde(default = "builtin_price_table")]
    pub pricing: PriceTable,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            pricing: builtin_price_table(),
        }
    }
}

/// Tracker behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit `metrics` counters and histograms for every recorded call.
    #[serde(default = "default_emit_metrics")]
    pub emit_metrics: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            emit_metrics: default_emit_metrics(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_emit_metrics() -> bool {
    true
}

/// OpenAI list prices in USD per million tokens, as `(model, prompt, completion)`.
///
/// `gpt-image-1` is billed on prompt tokens only.
const OPENAI_LIST_PRICES: &[(&str, f64, f64)] = &[
    ("gpt-4.1", 2.00, 8.00),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1-nano", 0.10, 0.40),
    ("gpt-4.5-preview", 75.00, 150.00),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4o-audio-preview", 2.50, 10.00),
    ("gpt-4o-realtime-preview", 5.00, 20.00),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o-mini-audio-preview", 0.15, 0.60),
    ("gpt-4o-mini-realtime-preview", 0.60, 2.40),
    ("o1", 15.00, 60.00),
    ("o1-pro", 150.00, 600.00),
    ("o3", 10.00, 40.00),
    ("o4-mini", 1.10, 4.40),
    ("o3-mini", 1.10, 4.40),
    ("o1-mini", 1.10, 4.40),
    ("gpt-4o-mini-search-preview", 0.15, 0.60),
    ("gpt-4o-search-preview", 2.50, 10.00),
    ("computer-use-preview", 3.00, 12.00),
    ("gpt-image-1", 5.00, 0.0),
];

/// The compiled-in price table: the OpenAI family only.
///
/// Other families are supplied through configuration.
pub fn builtin_price_table() -> PriceTable {
    let mut table = PriceTable::new();
    for &(model, prompt, completion) in OPENAI_LIST_PRICES {
        table.insert(
            ProviderFamily::OpenAi,
            model,
            ModelRate::per_million(prompt, completion),
        );
    }
    table
}
