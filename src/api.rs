//! Public API types for describing requests: environments, methods, content
//! encodings, transforms, error-handling policy, and the deep-merged
//! [`RequestDescriptor`] / [`RequestOverride`] pair.

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Ordered JSON object used for payloads, query parameters, and props.
///
/// `serde_json` is built with `preserve_order`, so insertion order survives
/// into query-string construction.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Deployment target an endpoint talks to. Resolved to a base URL by the
/// [`EnvironmentMap`] registered with the runtime builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Environment {
    Primary,
    Auth,
    Payments,
    /// An additional target registered under a custom name.
    Custom(String),
}

/// Mapping from [`Environment`] categories to base URLs.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentMap {
    map: HashMap<Environment, String>,
}

impl EnvironmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a base URL for an environment category.
    pub fn insert(&mut self, environment: Environment, base_url: impl Into<String>) {
        self.map.insert(environment, base_url.into());
    }

    /// Resolve an environment to its base URL; unmapped environments are a
    /// configuration error.
    pub fn resolve(&self, environment: &Environment) -> Result<&str> {
        self.map
            .get(environment)
            .map(String::as_str)
            .ok_or_else(|| ApiError::Config(format!("No base URL for environment {environment:?}")))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// HTTP method of a request description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ContentEncoding {
    #[default]
    Json,
    Form,
    FormMultipart,
}

impl ContentEncoding {
    /// The `Content-Type` header value for this encoding.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Form => "application/x-www-form-urlencoded",
            Self::FormMultipart => "multipart/form-data",
        }
    }

    /// Both form encodings carry the body as form fields rather than a
    /// structured JSON document.
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form | Self::FormMultipart)
    }
}

/// Explicit optional transform slot over the request's field map.
///
/// `None` at the descriptor level means identity pass-through; there is no
/// magic identity placeholder.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(JsonMap) -> JsonMap + Send + Sync>);

impl Transform {
    pub fn new(f: impl Fn(JsonMap) -> JsonMap + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, fields: JsonMap) -> JsonMap {
        (self.0)(fields)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(<fn>)")
    }
}

/// Endpoint path: a literal, or a function of (formatted payload, path params).
#[derive(Clone)]
pub enum PathSpec {
    Literal(String),
    Fn(Arc<dyn Fn(&JsonMap, &JsonMap) -> String + Send + Sync>),
}

impl PathSpec {
    pub fn from_fn(f: impl Fn(&JsonMap, &JsonMap) -> String + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    pub fn resolve(&self, formatted: &JsonMap, path_params: &JsonMap) -> String {
        match self {
            Self::Literal(path) => path.clone(),
            Self::Fn(f) => f(formatted, path_params),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        Self::Literal(path.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        Self::Literal(path)
    }
}

impl fmt::Debug for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => write!(f, "PathSpec::Literal({path:?})"),
            Self::Fn(_) => f.write_str("PathSpec::Fn(<fn>)"),
        }
    }
}

/// Query parameters: a static ordered map, or a function of the formatted
/// payload.
#[derive(Clone)]
pub enum QueryParamsSpec {
    Static(JsonMap),
    Fn(Arc<dyn Fn(&JsonMap) -> JsonMap + Send + Sync>),
}

impl QueryParamsSpec {
    pub fn from_fn(f: impl Fn(&JsonMap) -> JsonMap + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    pub fn resolve(&self, formatted: &JsonMap) -> JsonMap {
        match self {
            Self::Static(map) => map.clone(),
            Self::Fn(f) => f(formatted),
        }
    }
}

impl fmt::Debug for QueryParamsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(map) => write!(f, "QueryParamsSpec::Static({map:?})"),
            Self::Fn(_) => f.write_str("QueryParamsSpec::Fn(<fn>)"),
        }
    }
}

/// Per-endpoint error message: a literal, or a function of the failure
/// context (`errorId`, payload fields, query parameters).
#[derive(Clone)]
pub enum MessageSpec {
    Literal(String),
    Fn(Arc<dyn Fn(&JsonMap) -> String + Send + Sync>),
}

impl MessageSpec {
    pub fn from_fn(f: impl Fn(&JsonMap) -> String + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    pub fn resolve(&self, context: &JsonMap) -> String {
        match self {
            Self::Literal(message) => message.clone(),
            Self::Fn(f) => f(context),
        }
    }
}

impl From<&str> for MessageSpec {
    fn from(message: &str) -> Self {
        Self::Literal(message.to_string())
    }
}

impl fmt::Debug for MessageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(message) => write!(f, "MessageSpec::Literal({message:?})"),
            Self::Fn(_) => f.write_str("MessageSpec::Fn(<fn>)"),
        }
    }
}

// JSON overrides can only carry the literal form.
impl<'de> Deserialize<'de> for MessageSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::Literal(String::deserialize(deserializer)?))
    }
}

/// Customisation of the failure notice raised for an endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NoticeOptions {
    #[serde(alias = "duration")]
    pub duration_ms: Option<u64>,
    #[serde(alias = "isClosable")]
    pub closable: Option<bool>,
}

/// Fine-grained control over how a failed request surfaces to the user.
///
/// Flags are `Option<bool>` so that the merge can tell "unset" apart from
/// an explicit `false`: a later layer can switch a flag back off.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OnErrorPolicy {
    /// If defined, no other message source is consulted.
    pub message: Option<MessageSpec>,
    /// Further customisation of the failure notice.
    pub toast: Option<NoticeOptions>,
    /// Skip the generic fallback message.
    #[serde(alias = "skipDefault")]
    pub skip_default: Option<bool>,
    /// Skip the catalog lookup by server error identifier.
    #[serde(alias = "skipErrorId", alias = "skipPrimerErrorId")]
    pub skip_error_id: Option<bool>,
    /// Show no notice at all - useful when the error is handled by some
    /// visual error state.
    #[serde(alias = "skipAll")]
    pub skip_all: Option<bool>,
}

/// Error-handling policy attached to every outgoing request and recovered by
/// the failure interceptor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorPolicy {
    /// Reserved for a page-reload side effect that is currently disabled.
    #[serde(alias = "skipReloadOnUnauthorized")]
    pub skip_reload_on_unauthorized: Option<bool>,
    /// Leave the session store untouched on 401/403.
    #[serde(alias = "skipTokenPurgingOnUnauthorized")]
    pub skip_token_purging_on_unauthorized: Option<bool>,
    #[serde(alias = "onError")]
    pub on_error: Option<OnErrorPolicy>,
}

impl ErrorPolicy {
    /// Key-wise merge: a field present in the later layer replaces the base
    /// value (an explicit `false` overrides an earlier `true`), an absent
    /// field keeps it.
    pub fn merged(&self, over: &ErrorPolicy) -> ErrorPolicy {
        let on_error = match (&self.on_error, &over.on_error) {
            (Some(base), Some(over)) => Some(OnErrorPolicy {
                message: over.message.clone().or_else(|| base.message.clone()),
                toast: match (&base.toast, &over.toast) {
                    (Some(b), Some(o)) => Some(NoticeOptions {
                        duration_ms: o.duration_ms.or(b.duration_ms),
                        closable: o.closable.or(b.closable),
                    }),
                    (b, o) => o.clone().or_else(|| b.clone()),
                },
                skip_default: over.skip_default.or(base.skip_default),
                skip_error_id: over.skip_error_id.or(base.skip_error_id),
                skip_all: over.skip_all.or(base.skip_all),
            }),
            (base, over) => over.clone().or_else(|| base.clone()),
        };
        ErrorPolicy {
            skip_reload_on_unauthorized: over
                .skip_reload_on_unauthorized
                .or(self.skip_reload_on_unauthorized),
            skip_token_purging_on_unauthorized: over
                .skip_token_purging_on_unauthorized
                .or(self.skip_token_purging_on_unauthorized),
            on_error,
        }
    }
}

/// Declarative description of how to build one HTTP call.
///
/// Definition-time descriptors are deep-merged with call-time
/// [`RequestOverride`]s: scalars replace, nested maps merge key-wise.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub environment: Environment,
    pub path: PathSpec,
    pub method: Method,
    pub content: ContentEncoding,
    pub query_params: Option<QueryParamsSpec>,
    /// Attach the bearer token when one is available. Defaults to `true`.
    pub authenticate: bool,
    /// Raw input -> formatted input. `None` is identity.
    pub format: Option<Transform>,
    /// Formatted input -> wire payload. `None` is identity.
    pub payload: Option<Transform>,
    pub error_policy: ErrorPolicy,
}

impl RequestDescriptor {
    pub fn new(environment: Environment, path: impl Into<PathSpec>, method: Method) -> Self {
        Self {
            environment,
            path: path.into(),
            method,
            content: ContentEncoding::Json,
            query_params: None,
            authenticate: true,
            format: None,
            payload: None,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// The static query-parameter map, when one is configured. Function-based
    /// specs resolve per call and have no static form.
    pub fn static_query_params(&self) -> Option<JsonMap> {
        match &self.query_params {
            Some(QueryParamsSpec::Static(map)) => Some(map.clone()),
            _ => None,
        }
    }

    /// Deep-merge a call-time override into this descriptor.
    ///
    /// Call-time scalars replace definition-time values; static query-param
    /// maps and the error policy merge key-wise, so overriding one field never
    /// erases unrelated nested fields.
    pub fn merged(&self, over: &RequestOverride) -> RequestDescriptor {
        let path = if let Some(f) = &over.path_fn {
            f.clone()
        } else if let Some(path) = &over.path {
            PathSpec::Literal(path.clone())
        } else {
            self.path.clone()
        };

        let query_params = if let Some(f) = &over.query_params_fn {
            Some(f.clone())
        } else if let Some(over_map) = &over.query_params {
            match &self.query_params {
                Some(QueryParamsSpec::Static(base)) => {
                    let mut merged = base.clone();
                    deep_merge(&mut merged, over_map);
                    Some(QueryParamsSpec::Static(merged))
                }
                // A function-based definition cannot merge with a static
                // override; the override wins wholesale.
                _ => Some(QueryParamsSpec::Static(over_map.clone())),
            }
        } else {
            self.query_params.clone()
        };

        let error_policy = match &over.error_policy {
            Some(over_policy) => self.error_policy.merged(over_policy),
            None => self.error_policy.clone(),
        };

        RequestDescriptor {
            environment: over.environment.clone().unwrap_or_else(|| self.environment.clone()),
            path,
            method: over.method.unwrap_or(self.method),
            content: over.content.unwrap_or(self.content),
            query_params,
            authenticate: over.authenticate.unwrap_or(self.authenticate),
            format: over.format.clone().or_else(|| self.format.clone()),
            payload: over.payload.clone().or_else(|| self.payload.clone()),
            error_policy,
        }
    }
}

/// Call-time partial of a [`RequestDescriptor`].
///
/// Data-bearing fields deserialize from a JSON map (the argument
/// disambiguator path); function-valued fields are `#[serde(skip)]` and can
/// only be supplied programmatically.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestOverride {
    #[serde(alias = "url")]
    pub path: Option<String>,
    pub method: Option<Method>,
    pub content: Option<ContentEncoding>,
    #[serde(alias = "queryParams")]
    pub query_params: Option<JsonMap>,
    pub authenticate: Option<bool>,
    #[serde(alias = "errorPolicy", alias = "params")]
    pub error_policy: Option<ErrorPolicy>,
    #[serde(skip)]
    pub environment: Option<Environment>,
    #[serde(skip)]
    pub path_fn: Option<PathSpec>,
    #[serde(skip)]
    pub query_params_fn: Option<QueryParamsSpec>,
    #[serde(skip)]
    pub format: Option<Transform>,
    #[serde(skip)]
    pub payload: Option<Transform>,
}

/// Recursively merge `overlay` into `base`: nested objects merge key-wise,
/// everything else replaces.
pub(crate) fn deep_merge(base: &mut JsonMap, overlay: &JsonMap) {
    use serde_json::Value;
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_obj)), Value::Object(over_obj)) => {
                deep_merge(base_obj, over_obj);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> RequestDescriptor {
        let mut desc = RequestDescriptor::new(Environment::Primary, "/users", Method::Get);
        desc.query_params = Some(QueryParamsSpec::Static(
            json!({ "page": 1, "filter": { "active": true, "role": "admin" } })
                .as_object()
                .unwrap()
                .clone(),
        ));
        desc
    }

    #[test]
    fn override_of_one_field_keeps_unrelated_nested_fields() {
        let over: RequestOverride =
            serde_json::from_value(json!({ "queryParams": { "filter": { "role": "viewer" } } }))
                .unwrap();
        let merged = descriptor().merged(&over);
        let params = merged.static_query_params().unwrap();
        assert_eq!(params["page"], json!(1));
        assert_eq!(params["filter"]["active"], json!(true));
        assert_eq!(params["filter"]["role"], json!("viewer"));
    }

    #[test]
    fn override_scalar_replaces() {
        let over: RequestOverride =
            serde_json::from_value(json!({ "url": "/accounts", "method": "POST" })).unwrap();
        let merged = descriptor().merged(&over);
        assert!(matches!(merged.path, PathSpec::Literal(ref p) if p == "/accounts"));
        assert_eq!(merged.method, Method::Post);
        // Unrelated fields untouched.
        assert_eq!(merged.content, ContentEncoding::Json);
        assert!(merged.authenticate);
    }

    #[test]
    fn error_policy_merge_prefers_later_layer_message() {
        let base = ErrorPolicy {
            on_error: Some(OnErrorPolicy {
                message: Some("definition message".into()),
                skip_default: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let over = ErrorPolicy {
            on_error: Some(OnErrorPolicy {
                message: Some("usage message".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = base.merged(&over);
        let on_error = merged.on_error.unwrap();
        assert!(matches!(on_error.message, Some(MessageSpec::Literal(ref m)) if m == "usage message"));
        assert_eq!(on_error.skip_default, Some(true)); // unset layer keeps it
    }

    #[test]
    fn error_policy_merge_lets_later_false_replace_earlier_true() {
        let base = ErrorPolicy {
            skip_token_purging_on_unauthorized: Some(true),
            on_error: Some(OnErrorPolicy {
                skip_default: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let over: ErrorPolicy = serde_json::from_value(json!({
            "skipTokenPurgingOnUnauthorized": false,
            "onError": { "skipDefault": false }
        }))
        .unwrap();

        let merged = base.merged(&over);
        assert_eq!(merged.skip_token_purging_on_unauthorized, Some(false));
        assert_eq!(merged.on_error.unwrap().skip_default, Some(false));
    }

    #[test]
    fn content_encoding_mime_types() {
        assert_eq!(ContentEncoding::Json.content_type(), "application/json");
        assert_eq!(
            ContentEncoding::Form.content_type(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            ContentEncoding::FormMultipart.content_type(),
            "multipart/form-data"
        );
    }

    #[test]
    fn content_encoding_deserializes_kebab_case() {
        let over: RequestOverride =
            serde_json::from_value(json!({ "content": "form-multipart" })).unwrap();
        assert_eq!(over.content, Some(ContentEncoding::FormMultipart));
    }

    #[test]
    fn path_fn_resolves_with_params() {
        let spec = PathSpec::from_fn(|_, params| {
            format!("/users/{}", params["userId"].as_str().unwrap_or(""))
        });
        let params = json!({ "userId": "u-7" }).as_object().unwrap().clone();
        assert_eq!(spec.resolve(&JsonMap::new(), &params), "/users/u-7");
    }

    #[test]
    fn environment_map_rejects_unmapped() {
        let mut envs = EnvironmentMap::new();
        envs.insert(Environment::Primary, "https://api.example.com");
        assert_eq!(
            envs.resolve(&Environment::Primary).unwrap(),
            "https://api.example.com"
        );
        assert!(envs.resolve(&Environment::Auth).is_err());
    }
}
