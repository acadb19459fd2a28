// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! known provider families, a populated OpenAI table, finite non-negative
//! rates, and a recognized log level.

use std::str::FromStr;

use tally_core::ProviderFamily;

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::TallyConfig;

/// Log levels accepted by `tracker.log_level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TallyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.tracker.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "tracker.log_level `{}` is not one of: {}",
                config.tracker.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let known_families: Vec<&str> = ProviderFamily::ALL.into_iter().map(Into::into).collect();
    for (family, models) in config.pricing.families() {
        if ProviderFamily::from_str(family).is_err() {
            let hint = match suggest_key(family, &known_families) {
                Some(s) => format!(" (did you mean `{s}`?)"),
                None => String::new(),
            };
            errors.push(ConfigError::Validation {
                message: format!(
                    "pricing.{family} is not a known provider family{hint}; expected one of: {}",
                    known_families.join(", ")
                ),
            });
        }

        for (model, rate) in models {
            for (kind, value) in [("prompt", rate.prompt), ("completion", rate.completion)] {
                if !value.is_finite() || value < 0.0 {
                    let key = format!("pricing.{family}.\"{model}\".{kind}");
                    errors.push(ConfigError::Validation {
                        message: format!("{key} must be a non-negative number, got {value}"),
                    });
                }
            }
        }
    }

    let openai_priced = config
        .pricing
        .family(ProviderFamily::OpenAi.into())
        .is_some_and(|models| !models.is_empty());
    if !openai_priced {
        errors.push(ConfigError::Validation {
            message: "pricing.openai must price at least one model".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ModelRate, PriceTable};

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        let config = TallyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn negative_rate_fails_validation() {
        let mut config = TallyConfig::default();
        let rate = ModelRate::new(-1.0, 0.0);
        config
            .pricing
            .insert(ProviderFamily::Anthropic, "claude-3-opus", rate);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(messages(&errors)[0].contains("claude-3-opus"));
    }

    #[test]
    fn non_finite_rate_fails_validation() {
        let mut config = TallyConfig::default();
        let rate = ModelRate::new(0.0, f64::NAN);
        config
            .pricing
            .insert(ProviderFamily::Google, "gemini-1.5-pro", rate);
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("completion"));
    }

    #[test]
    fn empty_openai_table_fails_validation() {
        let config = TallyConfig {
            pricing: PriceTable::new(),
            ..TallyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("pricing.openai"));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = TallyConfig::default();
        config.tracker.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("tracker.log_level"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TallyConfig {
            pricing: PriceTable::new(),
            ..TallyConfig::default()
        };
        config.tracker.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn unknown_family_from_toml_suggests_closest() {
        let config: TallyConfig = toml::from_str(
            r#"
[pricing.openai."gpt-4.1"]
prompt = 0.000002
completion = 0.000008

[pricing.antropic.claude-3-opus]
prompt = 0.000015
"#,
        )
        .unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(messages(&errors)[0].contains("did you mean `anthropic`"));
    }

    #[test]
    fn dotted_model_names_need_quoted_keys() {
        let quoted: TallyConfig = toml::from_str(
            r#"
[pricing.openai."gpt-4.1"]
prompt = 0.000002

[pricing.google."gemini-1.5-flash"]
prompt = 0.000000075
completion = 0.0000003
"#,
        )
        .unwrap();
        assert!(validate_config(&quoted).is_ok());
        assert!(
            quoted
                .pricing
                .get(ProviderFamily::Google, "gemini-1.5-flash")
                .is_some()
        );

        // A bare dotted key splits into nested tables and no longer fits a rate.
        let bare = toml::from_str::<TallyConfig>(
            "[pricing.google.gemini-1.5-flash]\nprompt = 0.000000075\n",
        );
        assert!(bare.is_err());
    }
}
