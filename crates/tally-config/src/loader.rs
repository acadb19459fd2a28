// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tally.toml` > `~/.config/tally/tally.toml` > `/etc/tally/tally.toml`
//! with environment variable overrides via `TALLY_` prefix. Price tables from
//! every layer merge recursively, so a local file can add an `anthropic`
//! family on top of the built-in OpenAI prices.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TallyConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tally/tally.toml";

/// Local config file name, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tally.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults (including the built-in OpenAI price table)
/// 2. `/etc/tally/tally.toml` (system-wide)
/// 3. `~/.config/tally/tally.toml` (user XDG config)
/// 4. `./tally.toml` (local directory)
/// 5. `TALLY_*` environment variables
pub fn load_config() -> Result<TallyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/tally/tally.toml`, when the platform has a config directory.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    let dir = dirs::config_dir()?;
    Some(dir.join("tally").join("tally.toml"))
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::filter_map()` rather than `Env::split("_")` so that
/// `TALLY_TRACKER_LOG_LEVEL` maps to `tracker.log_level`, not
/// `tracker.log.level`. Prices are not settable from the environment.
fn env_provider() -> Env {
    Env::prefixed("TALLY_").filter_map(|key| {
        key.as_str()
            .to_ascii_lowercase()
            .strip_prefix("tracker_")
            .map(|field| format!("tracker.{field}").into())
    })
}
