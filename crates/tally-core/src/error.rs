// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tally cost accounting layer.

use thiserror::Error;

/// The primary error type used across the Tally crates.
///
/// Every cost-attribution failure is detected before the ledger is touched,
/// so returning one of these never leaves a partially recorded call behind.
#[derive(Debug, Error)]
pub enum TallyError {
    /// No model identifier could be resolved from the caller.
    #[error("no model identifier could be resolved for the call")]
    MissingModelIdentifier,

    /// The model identifier matches no known provider family.
    #[error("unsupported provider for model `{model}`")]
    UnsupportedProvider { model: String },

    /// The provider family is known but the model has no price table entry.
    #[error("no pricing for model `{model}` in the {family} price table")]
    UnknownModelPricing { family: String, model: String },

    /// The response index points past the end of a sequence-valued result.
    #[error("response index {index} is out of range for a result of length {len}")]
    ResponseIndexOutOfRange { index: usize, len: usize },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
