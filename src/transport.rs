//! The HTTP transport seam: wire-level request/response types, the
//! [`HttpTransport`] trait every dispatch goes through, and the built-in
//! reqwest implementation (feature `transport-reqwest`).
//!
//! Transports report connection-level failures as [`ApiError::Transport`];
//! non-2xx statuses come back as `Ok(WireResponse)` so the failure
//! interceptor owns the policy for them.

use crate::api::{JsonMap, Method};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// How the request body travels over the wire.
#[derive(Debug, Clone)]
pub enum WireBody {
    Empty,
    Json(Value),
    Form(JsonMap),
    Multipart(JsonMap),
}

/// A fully-resolved outgoing request.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: String,
    pub method: Method,
    /// Ordered header list; later duplicates win at the transport.
    pub headers: Vec<(String, String)>,
    pub body: WireBody,
}

impl WireRequest {
    /// The first header value with the given name, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A decoded incoming response. `body` is the parsed JSON document, or a
/// string/null value when the body was not JSON.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Value,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pluggable HTTP client. The rest of the crate depends only on this trait,
/// so tests script responses without a network and applications can swap the
/// client wholesale.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse>;
}

#[cfg(feature = "transport-reqwest")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "transport-reqwest")]
mod reqwest_transport {
    use super::*;
    use crate::error::ApiError;

    /// [`HttpTransport`] over a shared [`reqwest::Client`] with a cookie
    /// store enabled. No explicit request timeout is set; only the retry
    /// path uses a timer.
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl Default for ReqwestTransport {
        fn default() -> Self {
            let client = reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap_or_else(|error| {
                    tracing::warn!(%error, "HTTP client build failed, falling back to defaults without a cookie store");
                    reqwest::Client::new()
                });
            Self { client }
        }
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn field_as_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn execute(&self, request: &WireRequest) -> Result<WireResponse> {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            let mut builder = self.client.request(method, &request.url);

            for (name, value) in &request.headers {
                // Multipart bodies set their own boundary-qualified content type.
                if matches!(request.body, WireBody::Multipart(_))
                    && name.eq_ignore_ascii_case("content-type")
                {
                    continue;
                }
                builder = builder.header(name, value);
            }

            builder = match &request.body {
                WireBody::Empty => builder,
                WireBody::Json(value) => builder.json(value),
                WireBody::Form(fields) => {
                    let pairs: Vec<(String, String)> = fields
                        .iter()
                        .map(|(key, value)| (key.clone(), field_as_string(value)))
                        .collect();
                    builder.form(&pairs)
                }
                WireBody::Multipart(fields) => {
                    let mut form = reqwest::multipart::Form::new();
                    for (key, value) in fields {
                        form = form.text(key.clone(), field_as_string(value));
                    }
                    builder.multipart(form)
                }
            };

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            let body = if text.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };

            Ok(WireResponse {
                status: status.as_u16(),
                status_text,
                body,
            })
        }
    }
}
