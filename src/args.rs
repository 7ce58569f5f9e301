//! Classification of the variable-length, variable-typed argument list
//! accepted by generated query endpoints.
//!
//! Call sites may pass 0-2 positional JSON values: at most one identifier,
//! at most one request-description override, at most one behavior override.
//! With two values the first is always the identifier; a lone value is
//! shape-sniffed against the known override field names.

use crate::api::RequestOverride;
use crate::config::QueryOverride;
use crate::error::{ApiError, Result};
use serde_json::Value;

/// Field names that mark a JSON map as a [`RequestOverride`].
const REQUEST_FIELDS: &[&str] = &[
    "url",
    "path",
    "method",
    "content",
    "queryParams",
    "query_params",
    "authenticate",
    "params",
    "errorPolicy",
    "error_policy",
];

/// Field names that mark a JSON map as a [`QueryOverride`].
const BEHAVIOR_FIELDS: &[&str] = &[
    "retry",
    "enabled",
    "keepPreviousData",
    "keep_previous_data",
    "staleTime",
    "stale_time",
];

/// Result of classifying a call-site argument list.
#[derive(Debug, Default, Clone)]
pub struct CallArgs {
    pub id: Option<Value>,
    pub request_override: Option<RequestOverride>,
    pub behavior_override: Option<QueryOverride>,
}

/// Classify 0-2 positional arguments.
///
/// - 0 args: empty result.
/// - 1 arg: shape-sniffed, no positional assumption.
/// - 2 args: first is always the identifier, second is shape-sniffed.
/// - More: [`ApiError::InvalidArguments`], fatal.
pub fn classify(args: &[Value]) -> Result<CallArgs> {
    match args {
        [] => Ok(CallArgs::default()),
        [only] => classify_one(only),
        [id, rest] => {
            let mut parsed = classify_one(rest)?;
            parsed.id = Some(id.clone());
            Ok(parsed)
        }
        _ => Err(ApiError::InvalidArguments(format!(
            "Expected at most 2 arguments, got {}",
            args.len()
        ))),
    }
}

/// Shape-sniff a single value.
///
/// Non-objects are identifiers. Objects are tested against the request
/// override field names first, then the behavior override field names; an
/// object matching neither is an object-valued identifier.
fn classify_one(arg: &Value) -> Result<CallArgs> {
    let Value::Object(map) = arg else {
        return Ok(CallArgs {
            id: Some(arg.clone()),
            ..Default::default()
        });
    };

    if REQUEST_FIELDS.iter().any(|field| map.contains_key(*field)) {
        let over: RequestOverride = serde_json::from_value(arg.clone())
            .map_err(|e| ApiError::Config(format!("Malformed request override: {e}")))?;
        return Ok(CallArgs {
            request_override: Some(over),
            ..Default::default()
        });
    }

    if BEHAVIOR_FIELDS.iter().any(|field| map.contains_key(*field)) {
        let over: QueryOverride = serde_json::from_value(arg.clone())
            .map_err(|e| ApiError::Config(format!("Malformed behavior override: {e}")))?;
        return Ok(CallArgs {
            behavior_override: Some(over),
            ..Default::default()
        });
    }

    Ok(CallArgs {
        id: Some(arg.clone()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_args_classify_to_empty() {
        let parsed = classify(&[]).unwrap();
        assert!(parsed.id.is_none());
        assert!(parsed.request_override.is_none());
        assert!(parsed.behavior_override.is_none());
    }

    #[test]
    fn number_is_an_id() {
        let parsed = classify(&[json!(5)]).unwrap();
        assert_eq!(parsed.id, Some(json!(5)));
    }

    #[test]
    fn string_is_an_id() {
        let parsed = classify(&[json!("user-42")]).unwrap();
        assert_eq!(parsed.id, Some(json!("user-42")));
    }

    #[test]
    fn map_with_request_field_is_a_request_override() {
        let parsed = classify(&[json!({ "url": "/x" })]).unwrap();
        let over = parsed.request_override.expect("request override");
        assert_eq!(over.path.as_deref(), Some("/x"));
        assert!(parsed.id.is_none());
    }

    #[test]
    fn map_with_behavior_field_is_a_behavior_override() {
        let parsed = classify(&[json!({ "retry": true })]).unwrap();
        let over = parsed.behavior_override.expect("behavior override");
        assert_eq!(over.retry, Some(true));
    }

    #[test]
    fn id_plus_behavior_override() {
        let parsed = classify(&[json!(5), json!({ "retry": true })]).unwrap();
        assert_eq!(parsed.id, Some(json!(5)));
        assert!(parsed.behavior_override.is_some());
        assert!(parsed.request_override.is_none());
    }

    #[test]
    fn unknown_map_is_an_object_valued_id() {
        let parsed = classify(&[json!({ "tenant": "acme", "region": "eu" })]).unwrap();
        assert_eq!(parsed.id, Some(json!({ "tenant": "acme", "region": "eu" })));
    }

    #[test]
    fn request_fields_take_precedence_over_behavior_fields() {
        // Carries fields from both known sets; request wins.
        let parsed = classify(&[json!({ "url": "/x", "retry": true })]).unwrap();
        assert!(parsed.request_override.is_some());
        assert!(parsed.behavior_override.is_none());
    }

    #[test]
    fn three_args_fail() {
        let err = classify(&[json!(1), json!(2), json!(3)]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments(_)));
    }
}
