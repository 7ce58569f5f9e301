//! Query endpoints: declarative definitions that fetch through the runtime
//! with layered behavior config, cache-key derivation, and caching.

use crate::api::{JsonMap, RequestDescriptor};
use crate::args::classify;
use crate::cache::{KeyInput, KeySpec};
use crate::config::{QueryConfig, QueryOverride, merge_query_configs};
use crate::error::{ApiError, Result};
use crate::runtime::ApiRuntime;
use serde_json::{Value, json};
use std::time::Duration;

/// Attempt cap when `retry` is enabled, including the initial call.
const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base backoff for behavior-level retries; doubled per attempt.
const RETRY_BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Definition-time description of a query endpoint.
#[derive(Debug, Clone)]
pub struct QueryDefinition {
    /// Cache key: literal, or derived per call from `{ id, queryParams }`.
    pub key: KeySpec,
    /// How to construct the API request.
    pub request: RequestDescriptor,
    /// Defaults for the query behavior.
    pub behavior: QueryOverride,
}

impl QueryDefinition {
    pub fn new(key: impl Into<KeySpec>, request: RequestDescriptor) -> Self {
        Self {
            key: key.into(),
            request,
            behavior: QueryOverride::default(),
        }
    }
}

/// A ready-to-call query with a dynamic argument signature.
///
/// `fetch` accepts 0-2 positional JSON values - an identifier, a request
/// override, and/or a behavior override in any sensible combination:
///
/// ```rust,no_run
/// # use api_relay::query::{QueryDefinition, QueryEndpoint};
/// # use api_relay::api::{Environment, Method, RequestDescriptor};
/// # use serde_json::json;
/// # async fn example(runtime: &api_relay::runtime::ApiRuntime) -> api_relay::error::Result<()> {
/// let users = QueryEndpoint::new(QueryDefinition::new(
///     "users",
///     RequestDescriptor::new(Environment::Primary, "/users", Method::Get),
/// ));
///
/// users.fetch(runtime, &[]).await?;
/// users.fetch(runtime, &[json!(5)]).await?;
/// users.fetch(runtime, &[json!(5), json!({ "staleTime": 5000 })]).await?;
/// # Ok(())
/// # }
/// ```
pub struct QueryEndpoint {
    definition: QueryDefinition,
    defaults: QueryConfig,
}

impl QueryEndpoint {
    pub fn new(definition: QueryDefinition) -> Self {
        Self {
            definition,
            defaults: QueryConfig::default(),
        }
    }

    /// Replace the default behavior layer (the bottom of the three-layer
    /// merge).
    pub fn with_defaults(mut self, defaults: QueryConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Classify `args`, merge configs, and fetch: from the cache when fresh,
    /// otherwise over the network.
    pub async fn fetch(&self, runtime: &ApiRuntime, args: &[Value]) -> Result<Value> {
        let parsed = classify(args)?;

        let behavior = merge_query_configs(
            &self.defaults,
            Some(&self.definition.behavior),
            parsed.behavior_override.as_ref(),
        );
        let descriptor = match &parsed.request_override {
            Some(over) => self.definition.request.merged(over),
            None => self.definition.request.clone(),
        };

        let key_input = KeyInput {
            id: parsed.id.clone(),
            query_params: descriptor.static_query_params(),
            props: None,
        };
        let key = self.definition.key.resolve(&key_input).canonical();

        if !behavior.enabled {
            return match runtime.cache().peek(&key) {
                Some(value) => Ok(value),
                None => Err(ApiError::Disabled(key)),
            };
        }

        let stale_time = behavior.stale_time.map(Duration::from_millis);
        if let Some(cached) = runtime.cache().get(&key, stale_time) {
            tracing::debug!(key, "Serving fresh cached query result");
            behavior.fire_success(&cached);
            behavior.fire_settled(Some(&cached), None);
            return Ok(cached);
        }

        let fields = match &parsed.id {
            Some(id) => json!({ "id": id }),
            None => Value::Object(JsonMap::new()),
        };

        let mut attempts = 0u32;
        let result = loop {
            attempts += 1;
            match runtime.execute(&descriptor, &fields, &JsonMap::new()).await {
                Ok(value) => break Ok(value),
                Err(error)
                    if behavior.retry && error.is_retryable() && attempts < RETRY_MAX_ATTEMPTS =>
                {
                    let backoff = RETRY_BASE_BACKOFF * 2u32.saturating_pow(attempts - 1);
                    tracing::warn!(
                        key,
                        attempt = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Retrying query fetch"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => break Err(error),
            }
        };

        match result {
            Ok(value) => {
                runtime.cache().put(&key, value.clone());
                behavior.fire_success(&value);
                behavior.fire_settled(Some(&value), None);
                Ok(value)
            }
            Err(error) => {
                behavior.fire_error(&error);
                behavior.fire_settled(None, Some(&error));
                if behavior.keep_previous_data {
                    if let Some(previous) = runtime.cache().peek(&key) {
                        tracing::debug!(key, "Fetch failed, keeping previous data");
                        return Ok(previous);
                    }
                }
                Err(error)
            }
        }
    }
}
