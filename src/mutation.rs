//! Mutation endpoints: declarative definitions that dispatch writes through
//! the runtime with layered behavior config, props injection, and post-success
//! cache invalidation.

use crate::api::{JsonMap, RequestDescriptor, Transform};
use crate::cache::{KeyInput, KeySpec};
use crate::config::{MutationConfig, MutationOverride, merge_mutation_configs};
use crate::error::Result;
use crate::runtime::ApiRuntime;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Reserved payload field carrying caller-supplied contextual data into
/// callbacks and key functions. Never serialized onto the wire.
pub const PROPS_MARKER: &str = "$props";

/// Augments the caller-supplied parameters (already carrying the props
/// marker) before submission.
pub type AugmentParamsFn = Arc<dyn Fn(JsonMap) -> JsonMap + Send + Sync>;

/// Definition-time description of a mutation endpoint.
#[derive(Clone)]
pub struct MutationDefinition {
    /// How to construct the API request.
    pub request: RequestDescriptor,
    /// Defaults for the mutation behavior.
    pub behavior: MutationOverride,
    /// Cache keys invalidated after a successful mutation so dependent
    /// queries refetch fresh data.
    pub keys_to_refetch: Vec<KeySpec>,
    /// Optional transform over the outgoing call parameters.
    pub augment_params: Option<AugmentParamsFn>,
}

impl MutationDefinition {
    pub fn new(request: RequestDescriptor) -> Self {
        Self {
            request,
            behavior: MutationOverride::default(),
            keys_to_refetch: Vec::new(),
            augment_params: None,
        }
    }
}

impl fmt::Debug for MutationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationDefinition")
            .field("request", &self.request)
            .field("keys_to_refetch", &self.keys_to_refetch)
            .field("augment_params", &self.augment_params.is_some())
            .finish()
    }
}

/// A ready-to-call mutation.
pub struct MutationEndpoint {
    definition: MutationDefinition,
    defaults: MutationConfig,
}

impl MutationEndpoint {
    pub fn new(definition: MutationDefinition) -> Self {
        Self {
            definition,
            defaults: MutationConfig::default(),
        }
    }

    /// Replace the default behavior layer (the bottom of the three-layer
    /// merge).
    pub fn with_defaults(mut self, defaults: MutationConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Merge configs, inject the props marker, dispatch, and on success
    /// invalidate the configured cache keys.
    ///
    /// When `throw_on_error` is unset the failure has already been surfaced
    /// through the error chain and the notifier, and the call resolves to
    /// `Value::Null` instead of an `Err`.
    pub async fn mutate(
        &self,
        runtime: &ApiRuntime,
        params: Value,
        usage: Option<&MutationOverride>,
        request_override: Option<&crate::api::RequestOverride>,
    ) -> Result<Value> {
        let behavior = merge_mutation_configs(&self.defaults, Some(&self.definition.behavior), usage);
        let mut descriptor = match request_override {
            Some(over) => self.definition.request.merged(over),
            None => self.definition.request.clone(),
        };
        descriptor.payload = Some(strip_props_marker(descriptor.payload.take()));

        // Augment the caller's parameters with the props bag, then apply the
        // definition's own transform.
        let mut params_map = match params {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        };
        params_map.insert(
            PROPS_MARKER.to_string(),
            Value::Object(behavior.props.clone()),
        );
        let params_map = match &self.definition.augment_params {
            Some(augment) => augment(params_map),
            None => params_map,
        };
        let vars = Value::Object(params_map);

        behavior.fire_mutate(&vars);

        match runtime.execute(&descriptor, &vars, &JsonMap::new()).await {
            Ok(data) => {
                behavior.fire_success(&data, &vars);
                self.invalidate_keys(runtime, &behavior, &descriptor);
                behavior.fire_settled(Some(&data), None, &vars);
                Ok(data)
            }
            Err(error) => {
                behavior.fire_error(&error, &vars);
                behavior.fire_settled(None, Some(&error), &vars);
                if behavior.throw_on_error {
                    Err(error)
                } else {
                    Ok(Value::Null)
                }
            }
        }
    }

    fn invalidate_keys(
        &self,
        runtime: &ApiRuntime,
        behavior: &MutationConfig,
        descriptor: &RequestDescriptor,
    ) {
        if self.definition.keys_to_refetch.is_empty() {
            return;
        }
        let input = KeyInput {
            id: None,
            query_params: descriptor.static_query_params(),
            props: Some(behavior.props.clone()),
        };
        for key in &self.definition.keys_to_refetch {
            runtime.cache().invalidate(&key.resolve(&input).canonical());
        }
    }
}

/// Compose the descriptor's payload transform with an unconditional final
/// step that removes the props marker, so it never reaches the wire - even
/// when `augment_params` reintroduces a same-named field.
fn strip_props_marker(inner: Option<Transform>) -> Transform {
    Transform::new(move |fields| {
        let mut payload = match &inner {
            Some(transform) => transform.apply(fields),
            None => fields,
        };
        payload.remove(PROPS_MARKER);
        payload
    })
}
