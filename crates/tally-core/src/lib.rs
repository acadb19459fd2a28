// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tally cost accounting layer.
//!
//! This crate provides the error type and the shared data types used by the
//! configuration, pricing, and ledger crates.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TallyError;
pub use types::{ModelRate, PriceTable, ProviderFamily, UsageRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_error_has_all_variants() {
        let _missing = TallyError::MissingModelIdentifier;
        let _provider = TallyError::UnsupportedProvider {
            model: "unknown-model-x".into(),
        };
        let _pricing = TallyError::UnknownModelPricing {
            family: "openai".into(),
            model: "gpt-unknown".into(),
        };
        let _index = TallyError::ResponseIndexOutOfRange { index: 3, len: 2 };
        let _internal = TallyError::Internal("test".into());
    }

    #[test]
    fn error_messages_name_the_model() {
        let err = TallyError::UnknownModelPricing {
            family: "anthropic".into(),
            model: "claude-9".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("claude-9"), "got: {msg}");
        assert!(msg.contains("anthropic"), "got: {msg}");

        let err = TallyError::UnsupportedProvider {
            model: "unknown-model-x".into(),
        };
        assert!(err.to_string().contains("unknown-model-x"));
    }

    #[test]
    fn provider_family_serialization() {
        let family = ProviderFamily::Google;
        let json = serde_json::to_string(&family).expect("should serialize");
        assert_eq!(json, "\"google\"");
        let parsed: ProviderFamily = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(family, parsed);
    }
}
