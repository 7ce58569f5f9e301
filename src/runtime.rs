//! The central runtime that owns the transport, session store, notifier,
//! environment map, message catalog, and query cache.
//!
//! Obtain an instance via [`ApiRuntime::builder()`]. Endpoints created by
//! [`QueryEndpoint`](crate::query::QueryEndpoint) and
//! [`MutationEndpoint`](crate::mutation::MutationEndpoint) dispatch through
//! [`execute`](ApiRuntime::execute), which applies the request builder and
//! the failure interceptor and emits request metrics.

use crate::api::{EnvironmentMap, Environment, JsonMap, RequestDescriptor};
use crate::cache::QueryCache;
use crate::catalog::MessageCatalog;
use crate::error::{ApiError, Result};
use crate::interceptor;
use crate::notify::{LogNotifier, Notifier};
use crate::request::build_request;
use crate::session::{MemorySessionStore, SessionStore};
use crate::transport::HttpTransport;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub struct ApiRuntime {
    transport: Arc<dyn HttpTransport>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    environments: EnvironmentMap,
    catalog: MessageCatalog,
    cache: QueryCache,
}

impl ApiRuntime {
    /// Create a new [`ApiRuntimeBuilder`] for configuring and constructing a
    /// runtime.
    pub fn builder() -> ApiRuntimeBuilder {
        ApiRuntimeBuilder::default()
    }

    /// The query cache owned by this runtime.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The session store shared with this runtime.
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Build and execute one HTTP call described by `descriptor`.
    ///
    /// The access token is read per call, the failure interceptor handles
    /// retries/session purging/notices, and the decoded response body is
    /// returned on success.
    pub async fn execute(
        &self,
        descriptor: &RequestDescriptor,
        fields: &Value,
        path_params: &JsonMap,
    ) -> Result<Value> {
        let start = Instant::now();
        let token = self.session.access_token();
        let built = build_request(
            descriptor,
            &self.environments,
            token.as_deref(),
            fields,
            path_params,
        )?;

        tracing::debug!(
            method = %built.wire.method,
            url = %built.wire.url,
            "Dispatching API request"
        );

        let result = interceptor::dispatch(
            self.transport.as_ref(),
            self.session.as_ref(),
            self.notifier.as_ref(),
            &self.catalog,
            &built,
        )
        .await;

        let duration = start.elapsed();
        let status = if result.is_ok() { "success" } else { "failure" };

        metrics::histogram!(
            "api_request.duration_seconds",
            "method" => built.wire.method.as_str(),
        )
        .record(duration.as_secs_f64());

        metrics::counter!(
            "api_request.total",
            "method" => built.wire.method.as_str(),
            "status" => status,
        )
        .increment(1);

        result
    }
}

/// Builder for [`ApiRuntime`]. A transport and at least one environment
/// mapping are required; the session store defaults to an empty
/// [`MemorySessionStore`] and the notifier to [`LogNotifier`].
#[derive(Default)]
pub struct ApiRuntimeBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    session: Option<Arc<dyn SessionStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    environments: EnvironmentMap,
    catalog: MessageCatalog,
}

impl ApiRuntimeBuilder {
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn session(mut self, session: impl SessionStore + 'static) -> Self {
        self.session = Some(Arc::new(session));
        self
    }

    pub fn shared_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn shared_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Map an environment category to its base URL.
    pub fn environment(mut self, environment: Environment, base_url: impl Into<String>) -> Self {
        self.environments.insert(environment, base_url);
        self
    }

    /// Register an extra error-catalog entry.
    pub fn catalog_entry(
        mut self,
        error_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.catalog.insert(error_id, message);
        self
    }

    pub fn build(self) -> Result<ApiRuntime> {
        let transport = self
            .transport
            .ok_or_else(|| ApiError::Config("No transport registered".to_string()))?;
        if self.environments.is_empty() {
            return Err(ApiError::Config(
                "No environment base URLs registered".to_string(),
            ));
        }
        Ok(ApiRuntime {
            transport,
            session: self
                .session
                .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            environments: self.environments,
            catalog: self.catalog,
            cache: QueryCache::new(),
        })
    }
}
