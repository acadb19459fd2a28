// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tally - cost accounting for LLM calls.
//!
//! This is the binary entry point. It loads configuration, builds a cost
//! tracker over the configured price table, and dispatches subcommands.

mod check;
mod models;
mod price;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tally_config::TallyConfig;
use tally_core::ProviderFamily;

/// Tally - price LLM responses and inspect the price table.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Price a provider response read from a file or stdin.
    Price {
        /// Model identifier the response came from.
        model: String,
        /// JSON response file. Reads stdin when omitted.
        #[arg(long, value_name = "FILE")]
        response: Option<PathBuf>,
        /// Element carrying usage when the response is a JSON array.
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List priced models.
    Models {
        /// Only list this provider family.
        #[arg(long)]
        family: Option<ProviderFamily>,
        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration and report on the price table.
    Check,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(errors) => {
            tally_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.tracker.log_level);
    let use_color = !cli.plain && std::io::stdout().is_terminal();

    let result = match cli.command {
        Commands::Price {
            model,
            response,
            index,
            json,
        } => price::run_price(
            &config,
            &price::PriceArgs {
                model,
                response,
                index,
                json,
            },
            use_color,
        ),
        Commands::Models { family, json } => models::run_models(&config, family, json, use_color),
        Commands::Check => check::run_check(&config, cli.config.as_deref(), use_color),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("tally: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<TallyConfig, Vec<tally_config::ConfigError>> {
    match &cli.config {
        Some(path) => tally_config::load_and_validate_path(path),
        None => tally_config::load_and_validate(),
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tally={log_level},tally_cost={log_level},tally_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn price_arguments_parse() {
        let args = ["tally", "price", "gpt-4o", "--index", "1", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Price {
                model, index, json, response,
            } => {
                assert_eq!(model, "gpt-4o");
                assert_eq!(index, 1);
                assert!(json);
                assert!(response.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn family_filter_parses_lowercase_names() {
        let args = ["tally", "models", "--family", "anthropic"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models {
                family: Some(ProviderFamily::Anthropic),
                ..
            }
        ));

        let args = ["tally", "models", "--family", "mistral"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = ["tally", "check", "--config", "/tmp/t.toml", "--plain"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(cli.plain);
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = tally_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.tracker.log_level, "info");
        assert!(config.pricing.family("openai").is_some());
    }
}
