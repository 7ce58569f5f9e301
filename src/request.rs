//! The request builder: turns a [`RequestDescriptor`] plus call-time input
//! into a ready-to-send [`WireRequest`], and decodes response bodies.

use crate::api::{ContentEncoding, EnvironmentMap, JsonMap, Method, RequestDescriptor};
use crate::error::Result;
use crate::transport::{WireBody, WireRequest};
use serde_json::Value;

/// A wire request plus the request-scoped metadata the failure interceptor
/// consumes. The metadata never serializes onto the wire.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub wire: WireRequest,
    /// Error-handling policy recovered on failure.
    pub policy: crate::api::ErrorPolicy,
    /// Resolved query-parameter map, made available to message functions.
    pub query_params: JsonMap,
    /// Wire payload copy, made available to message functions.
    pub payload: Value,
}

/// Build one HTTP call from a descriptor and call-time input.
///
/// `fields` is formatted only when it is a JSON object; any other shape
/// formats an empty map. The bearer token is attached when present and the
/// descriptor asks for authentication.
pub fn build_request(
    descriptor: &RequestDescriptor,
    environments: &EnvironmentMap,
    token: Option<&str>,
    fields: &Value,
    path_params: &JsonMap,
) -> Result<BuiltRequest> {
    let formatted = match fields {
        Value::Object(map) => match &descriptor.format {
            Some(format) => format.apply(map.clone()),
            None => map.clone(),
        },
        _ => JsonMap::new(),
    };

    let endpoint = descriptor.path.resolve(&formatted, path_params);
    let query_params = descriptor
        .query_params
        .as_ref()
        .map(|spec| spec.resolve(&formatted));

    let mut headers = Vec::new();
    if descriptor.authenticate {
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
    }
    headers.push((
        "Content-Type".to_string(),
        descriptor.content.content_type().to_string(),
    ));

    let (body, payload) = if descriptor.method == Method::Get {
        (WireBody::Empty, Value::Object(JsonMap::new()))
    } else {
        let wire_payload = match &descriptor.payload {
            Some(payload) => payload.apply(formatted),
            None => formatted,
        };
        let payload_copy = Value::Object(wire_payload.clone());
        let body = if descriptor.content.is_form() {
            match descriptor.content {
                ContentEncoding::FormMultipart => WireBody::Multipart(wire_payload),
                _ => WireBody::Form(wire_payload),
            }
        } else {
            WireBody::Json(Value::Object(wire_payload))
        };
        (body, payload_copy)
    };

    let mut url = format!(
        "{}{}",
        environments.resolve(&descriptor.environment)?,
        endpoint
    );
    if let Some(params) = &query_params {
        url.push_str(&to_query_string(params));
    }

    Ok(BuiltRequest {
        wire: WireRequest {
            url,
            method: descriptor.method,
            headers,
            body,
        },
        policy: descriptor.error_policy.clone(),
        query_params: query_params.unwrap_or_default(),
        payload,
    })
}

/// Falsy values (null, false, 0, "") are dropped from the query string.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a literal query string: falsy entries dropped, values
/// percent-encoded, `k=v` pairs joined with `&`, `?`-prefixed only when at
/// least one entry survives. Insertion order is preserved.
pub fn to_query_string(fields: &JsonMap) -> String {
    let pairs: Vec<String> = fields
        .iter()
        .filter(|(_, value)| !is_falsy(value))
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value_as_string(value))))
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Decode a response body, unwrapping the cursor-pagination shortcut: an
/// object with an array-valued `data` field and no `prevCursor` key decodes
/// to the inner array; everything else passes through unchanged.
pub fn decode_response(body: Value) -> Value {
    if let Value::Object(map) = &body {
        if !map.contains_key("prevCursor") {
            if let Some(inner @ Value::Array(_)) = map.get("data") {
                return inner.clone();
            }
        }
    }
    body
}
