// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally models` command implementation.

use serde::Serialize;
use tally_config::TallyConfig;
use tally_core::{ProviderFamily, TallyError};
use tally_cost::pricing::round_usd;

/// One priced model, with rates shown per million tokens.
#[derive(Debug, Serialize)]
pub struct ModelRow {
    pub family: String,
    pub model: String,
    pub prompt_per_million: f64,
    pub completion_per_million: f64,
}

/// Rows for every priced model, optionally restricted to one family.
pub fn model_rows(config: &TallyConfig, family: Option<ProviderFamily>) -> Vec<ModelRow> {
    config
        .pricing
        .families()
        .filter(|(name, _)| family.is_none_or(|f| <&str>::from(f) == *name))
        .flat_map(|(name, models)| {
            models.iter().map(move |(model, rate)| ModelRow {
                family: name.to_string(),
                model: model.clone(),
                prompt_per_million: round_usd(rate.prompt * 1_000_000.0),
                completion_per_million: round_usd(rate.completion * 1_000_000.0),
            })
        })
        .collect()
}

/// Run the `tally models` command.
pub fn run_models(
    config: &TallyConfig,
    family: Option<ProviderFamily>,
    json: bool,
    use_color: bool,
) -> Result<(), TallyError> {
    let rows = model_rows(config, family);

    if json {
        let out = serde_json::to_string_pretty(&rows).map_err(|e| {
            TallyError::Internal(format!("failed to serialize model list: {e}"))
        })?;
        println!("{out}");
        return Ok(());
    }

    if rows.is_empty() {
        match family {
            Some(f) => println!("no models priced for family '{f}'"),
            None => println!("no models priced"),
        }
        return Ok(());
    }

    let width = rows.iter().map(|r| r.model.len()).max().unwrap_or(0);
    println!();
    println!(
        "  {:<10} {:<width$} {:>12} {:>12}",
        "FAMILY",
        "MODEL",
        "PROMPT/1M",
        "OUTPUT/1M"
    );
    println!("  {}", "-".repeat(38 + width));
    for row in &rows {
        let family = if use_color {
            use colored::Colorize;
            format!("{:<10}", row.family).cyan().to_string()
        } else {
            format!("{:<10}", row.family)
        };
        println!(
            "  {family} {:<width$} {:>12} {:>12}",
            row.model,
            format!("${}", row.prompt_per_million),
            format!("${}", row.completion_per_million),
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TallyConfig {
        tally_config::load_and_validate_str(
            r#"
[pricing.google."gemini-1.5-flash"]
prompt = 0.000000075
completion = 0.0000003
"#,
        )
        .unwrap()
    }

    #[test]
    fn lists_builtin_and_configured_models() {
        let rows = model_rows(&config(), None);
        let listed: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.family.as_str(), r.model.as_str()))
            .collect();
        assert!(listed.contains(&("openai", "gpt-4o")));
        assert!(listed.contains(&("google", "gemini-1.5-flash")));
    }

    #[test]
    fn rates_are_shown_per_million() {
        let rows = model_rows(&config(), Some(ProviderFamily::OpenAi));
        let gpt41 = rows.iter().find(|r| r.model == "gpt-4.1").unwrap();
        assert!((gpt41.prompt_per_million - 2.0).abs() < 1e-9);
        assert!((gpt41.completion_per_million - 8.0).abs() < 1e-9);

        let rows = model_rows(&config(), Some(ProviderFamily::Google));
        assert!((rows[0].prompt_per_million - 0.075).abs() < 1e-9);
    }

    #[test]
    fn family_filter_excludes_others() {
        let rows = model_rows(&config(), Some(ProviderFamily::Google));
        assert_eq!(rows.len(), 1);
        let rows = model_rows(&config(), Some(ProviderFamily::Anthropic));
        assert!(rows.is_empty());
    }
}
