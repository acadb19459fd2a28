// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally check` command implementation.
//!
//! Runs after configuration has loaded and validated, so every check here
//! looks for problems that are legal but will cause calls to fail closed.

use std::path::Path;

use tally_config::TallyConfig;
use tally_core::{ProviderFamily, TallyError};
use tally_cost::pricing;

/// Status of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Pass,
            message: message.into(),
        }
    }

    fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            message: message.into(),
        }
    }
}

/// Run every check against a loaded configuration.
pub fn run_checks(config: &TallyConfig, source: Option<&Path>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let origin = match source {
        Some(path) => path.display().to_string(),
        None => "standard locations".to_string(),
    };
    let message = format!("loaded from {origin}");
    results.push(CheckResult::pass("config", message));

    for family in ProviderFamily::ALL {
        results.push(check_family(config, family));
    }
    results.push(check_routing(config));
    results
}

fn check_family(config: &TallyConfig, family: ProviderFamily) -> CheckResult {
    let name = format!("pricing.{family}");
    match config.pricing.family(family.into()) {
        Some(models) if !models.is_empty() => {
            CheckResult::pass(name, format!("{} models priced", models.len()))
        }
        _ => CheckResult::warn(name, "no models priced; calls will be rejected"),
    }
}

/// Models priced under one family whose identifier resolves to another (or to none).
pub fn unreachable_models(config: &TallyConfig) -> Vec<String> {
    config
        .pricing
        .families()
        .flat_map(|(family, models)| {
            models
                .keys()
                .filter(move |model| {
                    pricing::provider_family(model)
                        .map_or(true, |resolved| <&str>::from(resolved) != family)
                })
                .map(move |model| format!("{family}.{model}"))
        })
        .collect()
}

fn check_routing(config: &TallyConfig) -> CheckResult {
    let unreachable = unreachable_models(config);
    if unreachable.is_empty() {
        CheckResult::pass("routing", "every priced model resolves to its family")
    } else {
        CheckResult::warn(
            "routing",
            format!(
                "never matched by family resolution: {}",
                unreachable.join(", ")
            ),
        )
    }
}

/// Run the `tally check` command.
pub fn run_check(
    config: &TallyConfig,
    source: Option<&Path>,
    use_color: bool,
) -> Result<(), TallyError> {
    let results = run_checks(config, source);

    println!();
    println!("  tally check");
    println!("  {}", "-".repeat(50));

    let mut warn_count = 0;
    for result in &results {
        let line = match result.status {
            CheckStatus::Pass if use_color => {
                use colored::Colorize;
                format!("    {} {:<18} {}", "✓".green(), result.name, result.message)
            }
            CheckStatus::Pass => format!("    [OK]   {:<18} {}", result.name, result.message),
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<18} {}",
                        "!".yellow(),
                        result.name,
                        result.message.yellow()
                    )
                } else {
                    format!("    [WARN] {:<18} {}", result.name, result.message)
                }
            }
        };
        println!("{line}");
    }

    println!();
    if warn_count > 0 {
        let issue_word = if warn_count == 1 { "issue" } else { "issues" };
        println!("  {warn_count} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_warn_for_unpriced_families() {
        let config = TallyConfig::default();
        let results = run_checks(&config, None);

        let status = |name: &str| {
            results
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.status.clone())
                .unwrap()
        };
        assert_eq!(status("config"), CheckStatus::Pass);
        assert_eq!(status("pricing.openai"), CheckStatus::Pass);
        assert_eq!(status("pricing.anthropic"), CheckStatus::Warn);
        assert_eq!(status("pricing.google"), CheckStatus::Warn);
    }

    #[test]
    fn builtin_table_has_one_unroutable_model() {
        let unreachable = unreachable_models(&TallyConfig::default());
        assert_eq!(unreachable, vec!["openai.computer-use-preview".to_string()]);
    }

    #[test]
    fn misfiled_model_is_reported() {
        let config = tally_config::load_and_validate_str(
            r#"
[pricing.anthropic.gpt-4o-copy]
prompt = 0.000001
"#,
        )
        .unwrap();
        let unreachable = unreachable_models(&config);
        assert!(unreachable.contains(&"anthropic.gpt-4o-copy".to_string()));
    }

    #[test]
    fn source_path_is_reported() {
        let results = run_checks(&TallyConfig::default(), Some(Path::new("/tmp/tally.toml")));
        assert_eq!(results[0].message, "loaded from /tmp/tally.toml");
    }
}
