//! The failure interceptor every dispatch runs through: bounded 401 retries
//! with a fixed delay, session purging on authorization failures, error
//! message resolution, notice display, and error annotation.

use crate::api::{ErrorPolicy, JsonMap};
use crate::catalog::MessageCatalog;
use crate::error::{ApiError, Result};
use crate::notify::{DEFAULT_NOTICE_DURATION_MS, Notice, NoticeStatus, Notifier};
use crate::request::{BuiltRequest, decode_response};
use crate::session::SessionStore;
use crate::transport::HttpTransport;
use serde_json::Value;
use std::time::Duration;

/// Maximum number of 401 retries per logical request.
pub const MAX_RETRIES: u32 = 3;

/// Fixed delay between 401 retries.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Execute a built request, applying the failure policy until it either
/// succeeds (decoded body) or fails for good (annotated error).
///
/// The retry counter is local to this call, so concurrent requests never
/// contend, and within one logical request every retry strictly follows the
/// prior failure plus the fixed delay.
pub(crate) async fn dispatch(
    transport: &dyn HttpTransport,
    session: &dyn SessionStore,
    notifier: &dyn Notifier,
    catalog: &MessageCatalog,
    built: &BuiltRequest,
) -> Result<Value> {
    let mut retries = 0u32;

    loop {
        let response = match transport.execute(&built.wire).await {
            Ok(response) => response,
            Err(error) => {
                // Connection-level failure: no status to retry on, but the
                // message policy still applies.
                let message =
                    resolve_message(&built.policy, None, &built.payload, &built.query_params, catalog);
                if let Some(title) = message {
                    notifier.notify(make_notice(&built.policy, title));
                }
                return Err(error);
            }
        };

        if response.is_success() {
            return Ok(decode_response(response.body));
        }

        let status = response.status;
        if status == 401 && retries < MAX_RETRIES {
            retries += 1;
            tracing::warn!(
                url = %built.wire.url,
                attempt = retries,
                delay_ms = RETRY_DELAY.as_millis() as u64,
                "Unauthorized response, retrying"
            );
            tokio::time::sleep(RETRY_DELAY).await;
            continue;
        }

        let error_id = response.body["error"]["errorId"]
            .as_str()
            .map(str::to_string);
        let server_message = response.body["message"].as_str().map(str::to_string);

        if status == 401 || status == 403 {
            if !built.policy.skip_token_purging_on_unauthorized.unwrap_or(false) {
                tracing::warn!(status, "Authorization failure, purging session");
                session.destroy();
                session.set_session(false);
            }
            // skip_reload_on_unauthorized is reserved for a page-reload side
            // effect that is currently disabled.
        }

        let resolved = resolve_message(
            &built.policy,
            error_id.as_deref(),
            &built.payload,
            &built.query_params,
            catalog,
        );

        // The server's own message wins over the locally resolved one.
        let title = server_message.clone().or(resolved);
        if let Some(title) = title {
            notifier.notify(make_notice(&built.policy, title));
        }

        return Err(ApiError::Http {
            status,
            status_text: response.status_text,
            error_id,
            message: server_message,
        });
    }
}

fn make_notice(policy: &ErrorPolicy, title: String) -> Notice {
    let toast = policy.on_error.as_ref().and_then(|p| p.toast.as_ref());
    Notice {
        title,
        status: NoticeStatus::Error,
        duration_ms: toast
            .and_then(|t| t.duration_ms)
            .unwrap_or(DEFAULT_NOTICE_DURATION_MS),
        closable: toast.and_then(|t| t.closable).unwrap_or(true),
    }
}

/// Resolve the user-facing message for a failure, top priority first:
///
/// 1. The policy's own `message` (literal, or function of the failure
///    context).
/// 2. The catalog entry for the server error identifier, unless skipped.
/// 3. The generic fallback, unless skipped.
///
/// With no `on_error` policy at all, the fallback always applies; with
/// `skip_all`, nothing does.
pub(crate) fn resolve_message(
    policy: &ErrorPolicy,
    error_id: Option<&str>,
    payload: &Value,
    query_params: &JsonMap,
    catalog: &MessageCatalog,
) -> Option<String> {
    let Some(on_error) = &policy.on_error else {
        return Some(catalog.fallback().to_string());
    };

    if on_error.skip_all.unwrap_or(false) {
        return None;
    }

    if let Some(message) = &on_error.message {
        return Some(message.resolve(&message_context(error_id, payload, query_params)));
    }

    if !on_error.skip_error_id.unwrap_or(false) {
        if let Some(entry) = error_id.and_then(|id| catalog.lookup(id)) {
            return Some(entry.to_string());
        }
    }

    if !on_error.skip_default.unwrap_or(false) {
        return Some(catalog.fallback().to_string());
    }

    None
}

/// Context handed to message functions: `errorId`, the payload's fields when
/// it is an object (non-object payloads contribute nothing), and the
/// resolved query parameters.
fn message_context(error_id: Option<&str>, payload: &Value, query_params: &JsonMap) -> JsonMap {
    let mut context = JsonMap::new();
    context.insert(
        "errorId".to_string(),
        error_id.map(|id| Value::String(id.to_string())).unwrap_or(Value::Null),
    );
    if let Value::Object(fields) = payload {
        for (key, value) in fields {
            context.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in query_params {
        context.insert(key.clone(), value.clone());
    }
    context
}
