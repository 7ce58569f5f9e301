//! Query and mutation behavior configs, and the three-layer merge that keeps
//! every layer's lifecycle callbacks alive.
//!
//! Callbacks are modelled as ordered observer chains rather than a single
//! overwritable slot: merging concatenates the default, definition, and usage
//! layers, and invoking a merged chain fires every registration exactly once
//! in that order. Chains hold infallible `Fn` closures, so one layer can
//! never short-circuit the layers after it.

use crate::api::{JsonMap, deep_merge};
use crate::error::ApiError;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Fired with the decoded response data after a successful query fetch.
pub type SuccessHook = Arc<dyn Fn(&Value) + Send + Sync>;
/// Fired with the failure after a query fetch errors.
pub type ErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;
/// Fired after every query fetch, success or failure.
pub type SettledHook = Arc<dyn Fn(Option<&Value>, Option<&ApiError>) + Send + Sync>;

/// Fired with the augmented variables before a mutation dispatches.
pub type MutateHook = Arc<dyn Fn(&Value) + Send + Sync>;
/// Fired with (data, variables) after a successful mutation.
pub type MutationSuccessHook = Arc<dyn Fn(&Value, &Value) + Send + Sync>;
/// Fired with (error, variables) after a failed mutation.
pub type MutationErrorHook = Arc<dyn Fn(&ApiError, &Value) + Send + Sync>;
/// Fired after every mutation, success or failure.
pub type MutationSettledHook = Arc<dyn Fn(Option<&Value>, Option<&ApiError>, &Value) + Send + Sync>;

/// Ordered sequence of observer registrations for one lifecycle event.
pub struct CallbackChain<F> {
    hooks: Vec<F>,
}

impl<F> Default for CallbackChain<F> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<F: Clone> Clone for CallbackChain<F> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<F> fmt::Debug for CallbackChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackChain(len={})", self.hooks.len())
    }
}

impl<F> CallbackChain<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: F) {
        self.hooks.push(hook);
    }

    pub fn with(mut self, hook: F) -> Self {
        self.push(hook);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, F> {
        self.hooks.iter()
    }
}

impl<F: Clone> CallbackChain<F> {
    /// Concatenate layers in invocation order (earlier layers first).
    fn merged(layers: &[&CallbackChain<F>]) -> CallbackChain<F> {
        let mut hooks = Vec::new();
        for layer in layers {
            hooks.extend(layer.hooks.iter().cloned());
        }
        CallbackChain { hooks }
    }
}

/// Fully-resolved query behavior after the three-layer merge.
#[derive(Clone, Debug)]
pub struct QueryConfig {
    /// Refetch retryable failures (up to 3 attempts with doubling backoff).
    pub retry: bool,
    /// Can the query be executed at all?
    pub enabled: bool,
    /// Serve the previous cached value instead of a refetch failure.
    pub keep_previous_data: bool,
    /// Milliseconds a cached value stays fresh. `None` means always stale.
    pub stale_time: Option<u64>,
    pub on_success: CallbackChain<SuccessHook>,
    pub on_error: CallbackChain<ErrorHook>,
    pub on_settled: CallbackChain<SettledHook>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry: false,
            enabled: true,
            keep_previous_data: false,
            stale_time: None,
            on_success: CallbackChain::new(),
            on_error: CallbackChain::new(),
            on_settled: CallbackChain::new(),
        }
    }
}

impl QueryConfig {
    pub fn fire_success(&self, data: &Value) {
        for hook in self.on_success.iter() {
            hook(data);
        }
    }

    pub fn fire_error(&self, error: &ApiError) {
        for hook in self.on_error.iter() {
            hook(error);
        }
    }

    pub fn fire_settled(&self, data: Option<&Value>, error: Option<&ApiError>) {
        for hook in self.on_settled.iter() {
            hook(data, error);
        }
    }
}

/// Partial query behavior supplied at definition or call time.
///
/// Data fields deserialize from a JSON map (the argument disambiguator path);
/// callback chains are `#[serde(skip)]` and registered programmatically.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryOverride {
    pub retry: Option<bool>,
    pub enabled: Option<bool>,
    #[serde(alias = "keepPreviousData")]
    pub keep_previous_data: Option<bool>,
    #[serde(alias = "staleTime")]
    pub stale_time: Option<u64>,
    #[serde(skip)]
    pub on_success: CallbackChain<SuccessHook>,
    #[serde(skip)]
    pub on_error: CallbackChain<ErrorHook>,
    #[serde(skip)]
    pub on_settled: CallbackChain<SettledHook>,
}

/// Layer default, definition, and usage query configs.
///
/// Scalars: later layer wins. Callback chains: concatenated so every layer's
/// callbacks for the same lifecycle event fire, default first, definition
/// second, usage last.
pub fn merge_query_configs(
    defaults: &QueryConfig,
    definition: Option<&QueryOverride>,
    usage: Option<&QueryOverride>,
) -> QueryConfig {
    let empty = QueryOverride::default();
    let definition = definition.unwrap_or(&empty);
    let usage = usage.unwrap_or(&empty);

    QueryConfig {
        retry: usage.retry.or(definition.retry).unwrap_or(defaults.retry),
        enabled: usage
            .enabled
            .or(definition.enabled)
            .unwrap_or(defaults.enabled),
        keep_previous_data: usage
            .keep_previous_data
            .or(definition.keep_previous_data)
            .unwrap_or(defaults.keep_previous_data),
        stale_time: usage
            .stale_time
            .or(definition.stale_time)
            .or(defaults.stale_time),
        on_success: CallbackChain::merged(&[
            &defaults.on_success,
            &definition.on_success,
            &usage.on_success,
        ]),
        on_error: CallbackChain::merged(&[
            &defaults.on_error,
            &definition.on_error,
            &usage.on_error,
        ]),
        on_settled: CallbackChain::merged(&[
            &defaults.on_settled,
            &definition.on_settled,
            &usage.on_settled,
        ]),
    }
}

/// Fully-resolved mutation behavior after the three-layer merge.
#[derive(Clone, Debug)]
pub struct MutationConfig {
    pub on_mutate: CallbackChain<MutateHook>,
    pub on_success: CallbackChain<MutationSuccessHook>,
    pub on_error: CallbackChain<MutationErrorHook>,
    pub on_settled: CallbackChain<MutationSettledHook>,
    /// Opaque bag injected into outgoing call parameters under the reserved
    /// props marker, and made available to invalidation key functions.
    pub props: JsonMap,
    /// Propagate a failed mutation as `Err`; `false` resolves quietly after
    /// the error chain and notifier have run.
    pub throw_on_error: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            on_mutate: CallbackChain::new(),
            on_success: CallbackChain::new(),
            on_error: CallbackChain::new(),
            on_settled: CallbackChain::new(),
            props: JsonMap::new(),
            throw_on_error: false,
        }
    }
}

impl MutationConfig {
    pub fn fire_mutate(&self, vars: &Value) {
        for hook in self.on_mutate.iter() {
            hook(vars);
        }
    }

    pub fn fire_success(&self, data: &Value, vars: &Value) {
        for hook in self.on_success.iter() {
            hook(data, vars);
        }
    }

    pub fn fire_error(&self, error: &ApiError, vars: &Value) {
        for hook in self.on_error.iter() {
            hook(error, vars);
        }
    }

    pub fn fire_settled(&self, data: Option<&Value>, error: Option<&ApiError>, vars: &Value) {
        for hook in self.on_settled.iter() {
            hook(data, error, vars);
        }
    }
}

/// Partial mutation behavior supplied at definition or call time.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MutationOverride {
    pub props: Option<JsonMap>,
    #[serde(alias = "throwOnError")]
    pub throw_on_error: Option<bool>,
    #[serde(skip)]
    pub on_mutate: CallbackChain<MutateHook>,
    #[serde(skip)]
    pub on_success: CallbackChain<MutationSuccessHook>,
    #[serde(skip)]
    pub on_error: CallbackChain<MutationErrorHook>,
    #[serde(skip)]
    pub on_settled: CallbackChain<MutationSettledHook>,
}

/// Layer default, definition, and usage mutation configs. Same chaining
/// discipline as [`merge_query_configs`]; `props` bags merge key-wise with
/// later layers winning per key.
pub fn merge_mutation_configs(
    defaults: &MutationConfig,
    definition: Option<&MutationOverride>,
    usage: Option<&MutationOverride>,
) -> MutationConfig {
    let empty = MutationOverride::default();
    let definition = definition.unwrap_or(&empty);
    let usage = usage.unwrap_or(&empty);

    let mut props = defaults.props.clone();
    if let Some(definition_props) = &definition.props {
        deep_merge(&mut props, definition_props);
    }
    if let Some(usage_props) = &usage.props {
        deep_merge(&mut props, usage_props);
    }

    MutationConfig {
        on_mutate: CallbackChain::merged(&[
            &defaults.on_mutate,
            &definition.on_mutate,
            &usage.on_mutate,
        ]),
        on_success: CallbackChain::merged(&[
            &defaults.on_success,
            &definition.on_success,
            &usage.on_success,
        ]),
        on_error: CallbackChain::merged(&[
            &defaults.on_error,
            &definition.on_error,
            &usage.on_error,
        ]),
        on_settled: CallbackChain::merged(&[
            &defaults.on_settled,
            &definition.on_settled,
            &usage.on_settled,
        ]),
        props,
        throw_on_error: usage
            .throw_on_error
            .or(definition.throw_on_error)
            .unwrap_or(defaults.throw_on_error),
    }
}
