// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment load failures into miette reports.
//!
//! An unknown key is labelled in the TOML file it was read from and, when a
//! valid key is close enough by Jaro-Winkler similarity, offered a correction.

// The Diagnostic derive writes span fields that are never read back.
#![allow(unused_assignments)]

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a key must exceed before it is offered as a correction.
const MIN_SIMILARITY: f64 = 0.75;

/// A TOML document as `(display name, content)`.
pub type TomlSource = (String, String);

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that the enclosing table does not accept.
    #[error("`{key}` is not a recognised configuration key")]
    #[diagnostic(
        code(tally::config::unknown_key),
        help("{}", key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest accepted key, if one is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same table.
        valid_keys: String,
        #[label("not accepted here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(tally::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        /// Dotted path to the value.
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(
        code(tally::config::missing_key),
        help("set `{key}` in tally.toml")
    )]
    MissingKey { key: String },

    /// A value that deserialized but breaks a semantic rule.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(tally::config::validation))]
    Validation { message: String },

    /// Any other figment failure, such as unreadable TOML.
    #[error("could not load configuration: {0}")]
    #[diagnostic(code(tally::config::load))]
    Load(String),
}

fn key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let accepted = format!("accepted keys here: {valid_keys}");
    match suggestion {
        Some(key) => format!("did you mean `{key}`? {accepted}"),
        None => accepted,
    }
}

impl ConfigError {
    fn from_figment(error: figment::Error, sources: &[TomlSource]) -> Self {
        match &error.kind {
            Kind::UnknownField(field, accepted) => {
                let (span, src) = locate_key(&error, field, sources).unzip();
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, accepted),
                    valid_keys: accepted.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {found}, expected {expected}"),
                expected: expected.clone(),
            },
            _ => ConfigError::Load(error.to_string()),
        }
    }
}

/// Convert every error carried by a `figment::Error` into a diagnostic.
///
/// `toml_sources` are the documents that were merged, used to point at the
/// offending line.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[TomlSource],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| ConfigError::from_figment(error, toml_sources))
        .collect()
}

fn locate_key(
    error: &figment::Error,
    field: &str,
    sources: &[TomlSource],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let (name, content) = origin(error, sources)?;
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// The document an error was read from. Inline strings carry no file
/// metadata, so a lone document is taken as the origin.
fn origin<'a>(error: &figment::Error, sources: &'a [TomlSource]) -> Option<&'a TomlSource> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| match &m.source {
            Some(figment::Source::File(path)) => Some(path.display().to_string()),
            _ => None,
        });

    match (file, sources) {
        (Some(file), _) => sources.iter().find(|(name, _)| *name == file),
        (None, [only]) => Some(only),
        (None, _) => None,
    }
}

/// Byte offset of `field` inside the table addressed by `path`.
///
/// The table is found by its header, so `["pricing", "openai", "gpt-4.1"]`
/// matches `[pricing.openai."gpt-4.1"]`. An empty path searches the top level.
/// Only lines up to the next header are considered.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path {
        [] => 0,
        _ => table_body_start(content, path)?,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let key = line.trim_start();
        if key.starts_with('[') {
            return None;
        }
        let assigns = key
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if assigns {
            return Some(offset + line.len() - key.len());
        }
        offset += line.len();
    }
    None
}

/// Offset of the first byte after the header line of the table at `path`.
fn table_body_start(content: &str, path: &[String]) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        offset += line.len();
        let header = line
            .trim()
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'));
        if header.is_some_and(|h| header_path(h) == path) {
            return Some(offset);
        }
    }
    None
}

/// Split a dotted header into its keys, dropping quotes and padding.
fn header_path(header: &str) -> Vec<String> {
    let mut keys = vec![String::new()];
    let mut in_quotes = false;
    for c in header.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => keys.push(String::new()),
            c if c.is_whitespace() && !in_quotes => {}
            c => {
                if let Some(key) = keys.last_mut() {
                    key.push(c);
                }
            }
        }
    }
    keys
}

/// The candidate most similar to `unknown`, if any clears [`MIN_SIMILARITY`].
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Write each error to stderr as a graphical miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        eprint!("{}", render(&handler, error));
    }
}

fn render(handler: &GraphicalReportHandler, error: &ConfigError) -> String {
    let mut out = String::new();
    match handler.render_report(&mut out, error) {
        Ok(()) => out,
        Err(_) => format!("Error: {error}\n"),
    }
}
