// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost-attribution interceptor.
//!
//! [`CostTracker::wrap`] and [`CostTracker::wrap_async`] turn an operation that
//! produces a provider response into one with the same inputs and output plus
//! a side effect: after the operation succeeds, its usage is priced and
//! appended to a ledger exactly once. Which ledger is decided per call by the
//! [`Caller`] passed as the first argument.
//!
//! Both wrappers funnel into [`CostTracker::record`], so blocking and async
//! calls share one pricing path. Pricing failures are detected before any
//! ledger is touched and are returned through the operation's own error type.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tally_config::TallyConfig;
use tally_core::{PriceTable, ProviderFamily, TallyError, UsageRecord};
use tracing::{info, warn};

use crate::ledger::Ledger;
use crate::{normalize, pricing, recording};

/// The first argument of a tracked call.
///
/// A caller either *is* the model identifier (`&str`, `String`), or is an
/// object that exposes one. Callers that own a [`Ledger`] return it from
/// [`Caller::ledger`] and their calls are recorded there instead of in the
/// tracker's shared ledger.
pub trait Caller {
    /// Model identifier for this call, if one can be resolved.
    fn model_name(&self) -> Option<&str>;

    /// The caller's own ledger, for ledger-owning callers.
    fn ledger(&self) -> Option<&Ledger> {
        None
    }
}

impl Caller for str {
    fn model_name(&self) -> Option<&str> {
        Some(self)
    }
}

impl Caller for String {
    fn model_name(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

/// A call with no positional arguments; never resolves a model.
impl Caller for () {
    fn model_name(&self) -> Option<&str> {
        None
    }
}

impl<T: Caller + ?Sized> Caller for &T {
    fn model_name(&self) -> Option<&str> {
        (**self).model_name()
    }

    fn ledger(&self) -> Option<&Ledger> {
        (**self).ledger()
    }
}

impl<T: Caller + ?Sized> Caller for Arc<T> {
    fn model_name(&self) -> Option<&str> {
        (**self).model_name()
    }

    fn ledger(&self) -> Option<&Ledger> {
        (**self).ledger()
    }
}

impl<T: Caller> Caller for Option<T> {
    fn model_name(&self) -> Option<&str> {
        self.as_ref().and_then(Caller::model_name)
    }

    fn ledger(&self) -> Option<&Ledger> {
        self.as_ref().and_then(Caller::ledger)
    }
}

/// A ready-made caller: a model identifier with or without its own ledger.
#[derive(Debug)]
pub struct ModelHandle {
    model_name: String,
    ledger: Option<Ledger>,
}

impl ModelHandle {
    /// A plain caller; its calls land in the tracker's shared ledger.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ledger: None,
        }
    }

    /// A ledger-owning caller; its calls are recorded only in its own ledger.
    pub fn with_ledger(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ledger: Some(Ledger::new()),
        }
    }
}

impl Caller for ModelHandle {
    fn model_name(&self) -> Option<&str> {
        Some(&self.model_name)
    }

    fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }
}

/// Which ledger a call was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LedgerScope {
    /// The tracker's shared ledger.
    Shared,
    /// The caller's own ledger.
    Caller,
}

/// What was appended to a ledger for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEntry {
    pub model: String,
    pub family: ProviderFamily,
    pub usage: UsageRecord,
    pub cost_usd: f64,
    pub scope: LedgerScope,
}

/// Prices completed calls and appends them to the right ledger.
///
/// Construct one at the composition root and share it through `Arc`; the
/// price table is read-only and each ledger synchronizes its own appends.
#[derive(Debug)]
pub struct CostTracker {
    prices: Arc<PriceTable>,
    shared: Ledger,
    emit_metrics: bool,
}

impl CostTracker {
    /// Create a tracker over the given price table with an empty shared ledger.
    pub fn new(prices: impl Into<Arc<PriceTable>>) -> Self {
        Self {
            prices: prices.into(),
            shared: Ledger::new(),
            emit_metrics: true,
        }
    }

    /// Create a tracker from loaded configuration.
    pub fn from_config(config: &TallyConfig) -> Self {
        Self::new(config.pricing.clone())
            .with_metrics(config.tracker.emit_metrics)
    }

    /// Create a tracker over the compiled-in OpenAI price table.
    pub fn with_builtin_prices() -> Self {
        Self::new(tally_config::builtin_price_table())
    }

    /// Enable or disable `metrics` emission for recorded calls.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.emit_metrics = enabled;
        self
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn shared_ledger(&self) -> &Ledger {
        &self.shared
    }

    /// Rounded total of the caller's ledger when it owns one, else of the
    /// shared ledger.
    pub fn total_cost(&self, caller: Option<&dyn Caller>) -> f64 {
        caller
            .and_then(|c| c.ledger())
            .unwrap_or(&self.shared)
            .total_cost()
    }

    /// Price a completed call's result and append it to the caller's scope.
    ///
    /// When `result` serializes to a sequence (tuple, `Vec`, array), the
    /// element at `response_index` carries the usage; otherwise the whole
    /// result does. Nothing is written unless the model resolves to a priced
    /// entry and the response index is in range.
    pub fn record<C, R>(
        &self,
        caller: &C,
        result: &R,
        response_index: usize,
    ) -> Result<CostEntry, TallyError>
    where
        C: Caller + ?Sized,
        R: Serialize + ?Sized,
    {
        let priced = caller
            .model_name()
            .ok_or(TallyError::MissingModelIdentifier)
            .and_then(|model| {
                let (family, rate) = pricing::lookup(&self.prices, model)?;
                let response = select_response(result, response_index)?;
                Ok((model, family, rate, response))
            });

        let (model, family, rate, response) = match priced {
            Ok(priced) => priced,
            Err(e) => {
                warn!(
                    model = caller.model_name().unwrap_or("<none>"),
                    error = %e,
                    "call completed but was not recorded"
                );
                if self.emit_metrics {
                    recording::record_rejected(rejection_reason(&e));
                }
                return Err(e);
            }
        };

        let usage = normalize::usage_from_value(&response);
        let cost_usd = pricing::calculate_cost(&usage, &rate);

        let (ledger, scope) = match caller.ledger() {
            Some(own) => (own, LedgerScope::Caller),
            None => (&self.shared, LedgerScope::Shared),
        };
        ledger.append(model, &usage, cost_usd);

        info!(
            model = %model,
            family = %family,
            scope = %scope,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            cost_usd,
            "cost recorded"
        );
        if self.emit_metrics {
            recording::record_call(model, family, scope, &usage, cost_usd);
        }

        Ok(CostEntry {
            model: model.to_string(),
            family,
            usage,
            cost_usd,
            scope,
        })
    }

    /// Wrap a blocking operation `Fn(&C, A) -> Result<R, E>`.
    pub fn wrap<F>(self: &Arc<Self>, op: F) -> Tracked<F> {
        Tracked {
            tracker: Arc::clone(self),
            response_index: 0,
            op,
        }
    }

    /// Wrap an async operation `Fn(&C, A) -> impl Future<Output = Result<R, E>>`.
    ///
    /// The returned future must own what it needs from the caller; clone out
    /// of it (or pass an `Arc` caller) before the `async move` block.
    pub fn wrap_async<F>(self: &Arc<Self>, op: F) -> TrackedAsync<F> {
        TrackedAsync {
            tracker: Arc::clone(self),
            response_index: 0,
            op,
        }
    }
}

fn select_response<R: Serialize + ?Sized>(result: &R, index: usize) -> Result<Value, TallyError> {
    // An unserializable result normalizes to zero usage, same as a missing one.
    let value = serde_json::to_value(result).unwrap_or(Value::Null);
    match value {
        Value::Array(mut items) => {
            let len = items.len();
            if index < len {
                Ok(items.swap_remove(index))
            } else {
                Err(TallyError::ResponseIndexOutOfRange { index, len })
            }
        }
        other => Ok(other),
    }
}

fn rejection_reason(e: &TallyError) -> &'static str {
    match e {
        TallyError::MissingModelIdentifier => "missing_model",
        TallyError::UnsupportedProvider { .. } => "unsupported_provider",
        TallyError::UnknownModelPricing { .. } => "unknown_pricing",
        TallyError::ResponseIndexOutOfRange { .. } => "response_index",
        _ => "other",
    }
}

/// A blocking operation whose successful calls are recorded.
pub struct Tracked<F> {
    tracker: Arc<CostTracker>,
    response_index: usize,
    op: F,
}

impl<F> Tracked<F> {
    /// Select the element of a sequence result that carries usage (default 0).
    pub fn with_response_index(mut self, index: usize) -> Self {
        self.response_index = index;
        self
    }

    /// Run the operation, then record it. Operation errors pass through
    /// untouched and record nothing.
    pub fn call<C, A, R, E>(&self, caller: &C, args: A) -> Result<R, E>
    where
        C: Caller + ?Sized,
        F: Fn(&C, A) -> Result<R, E>,
        R: Serialize,
        E: From<TallyError>,
    {
        let result = (self.op)(caller, args)?;
        self.tracker.record(caller, &result, self.response_index)?;
        Ok(result)
    }
}

/// An async operation whose successful calls are recorded.
///
/// Dropping the call future before the operation resolves records nothing.
pub struct TrackedAsync<F> {
    tracker: Arc<CostTracker>,
    response_index: usize,
    op: F,
}

impl<F> TrackedAsync<F> {
    /// Select the element of a sequence result that carries usage (default 0).
    pub fn with_response_index(mut self, index: usize) -> Self {
        self.response_index = index;
        self
    }

    /// Await the operation, then record it. The ledger append is synchronous,
    /// so no suspension point separates the cost from its token counts.
    pub async fn call<'c, C, A, R, E, Fut>(&self, caller: &'c C, args: A) -> Result<R, E>
    where
        C: Caller + ?Sized,
        F: Fn(&'c C, A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: Serialize,
        E: From<TallyError>,
    {
        let result = (self.op)(caller, args).await?;
        self.tracker.record(caller, &result, self.response_index)?;
        Ok(result)
    }
}
