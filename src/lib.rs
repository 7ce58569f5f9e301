//! Declarative query/mutation endpoints with layered configuration over a
//! pluggable HTTP transport.
//!
//! api-relay is a thin dispatch layer for applications that talk to a JSON
//! API: endpoints are declared once as a request description plus behavior
//! defaults, and every call site can override both with 0-2 loosely-typed
//! positional arguments. Cross-cutting concerns are centralized: bearer-token
//! injection, bounded retry on token expiry, user-facing error surfacing, and
//! query-cache invalidation after mutations.
//!
//! # Key concepts
//!
//! - **[`ApiRuntime`](runtime::ApiRuntime)** — the composition root owning
//!   the transport, session store, notifier, environment map, and query
//!   cache.
//! - **[`RequestDescriptor`](api::RequestDescriptor)** — a declarative
//!   description of one HTTP call, deep-merged with call-time
//!   [`RequestOverride`](api::RequestOverride)s.
//! - **[`QueryEndpoint`](query::QueryEndpoint)** /
//!   **[`MutationEndpoint`](mutation::MutationEndpoint)** — ready-to-call
//!   accessors produced from definitions, with three-layer behavior merging
//!   that chains lifecycle callbacks instead of overwriting them.
//! - **[`HttpTransport`](transport::HttpTransport)** — the seam the whole
//!   crate dispatches through; the built-in reqwest implementation is behind
//!   the `transport-reqwest` feature.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use api_relay::api::{Environment, Method, RequestDescriptor};
//! use api_relay::query::{QueryDefinition, QueryEndpoint};
//! use api_relay::runtime::ApiRuntime;
//! use api_relay::transport::ReqwestTransport;
//! use serde_json::json;
//!
//! # async fn example() -> api_relay::error::Result<()> {
//! let runtime = ApiRuntime::builder()
//!     .transport(ReqwestTransport::new())
//!     .environment(Environment::Primary, "https://api.example.com")
//!     .build()?;
//!
//! let users = QueryEndpoint::new(QueryDefinition::new(
//!     "users",
//!     RequestDescriptor::new(Environment::Primary, "/users", Method::Get),
//! ));
//!
//! let page = users.fetch(&runtime, &[json!({ "queryParams": { "page": 2 } })]).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod args;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod request;
pub mod runtime;
pub mod session;
pub mod transport;

#[cfg(test)]
mod mock;
