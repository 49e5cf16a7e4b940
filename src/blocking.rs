//! Synchronous call surface
//!
//! Wraps [`crate::Client`] and drives each call on a private current-thread
//! runtime, so the calling thread blocks until the response is read or the
//! timeout fires. Must not be used from inside an async runtime.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::client::{ClientBuilder, PostOptions};
use crate::error::Result;
use crate::params::{IntoParams, IntoPayload, Params};
use crate::request::RequestConfig;
use crate::response::RequestResult;

/// Blocking counterpart of [`crate::Client`]
pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

impl Client {
    /// Create a blocking client with default settings
    pub fn new() -> std::io::Result<Self> {
        Self::from_builder(ClientBuilder::new())
    }

    /// Build the wrapped client from `builder`.
    ///
    /// Pooled connections opened here are only driven while this client's
    /// runtime is blocking on a call, so the async client is never handed
    /// out. A transport passed through [`ClientBuilder::transport`] must not
    /// also serve an async client on another runtime.
    pub fn from_builder(builder: ClientBuilder) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: builder.build(),
            runtime,
        })
    }

    /// Get the wrapped client's default timeout
    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout()
    }

    pub fn execute(&self, correlation_id: &str, config: RequestConfig) -> Result<RequestResult> {
        self.runtime.block_on(self.inner.execute(correlation_id, config))
    }

    pub fn get(&self, correlation_id: &str, url: &str, query: impl IntoParams, timeout: Duration) -> Result<RequestResult> {
        self.runtime.block_on(self.inner.get(correlation_id, url, query, timeout))
    }

    pub fn post(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        headers: Option<Params>,
        timeout: Duration,
        multipart: bool,
    ) -> Result<RequestResult> {
        self.runtime
            .block_on(self.inner.post(correlation_id, url, payload, headers, timeout, multipart))
    }

    pub fn post_https(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        headers: Option<Params>,
        timeout: Duration,
        multipart: bool,
    ) -> Result<RequestResult> {
        self.runtime
            .block_on(self.inner.post_https(correlation_id, url, payload, headers, timeout, multipart))
    }

    pub fn post_with(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        options: PostOptions,
    ) -> Result<RequestResult> {
        self.runtime
            .block_on(self.inner.post_with(correlation_id, url, payload, options))
    }

    pub fn get_then_post(
        &self,
        correlation_id: &str,
        url: &str,
        query: impl IntoParams,
        body: impl IntoParams,
        timeout: Duration,
    ) -> Result<RequestResult> {
        self.runtime
            .block_on(self.inner.get_then_post(correlation_id, url, query, body, timeout))
    }

    pub fn put(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.runtime.block_on(self.inner.put(correlation_id, url, body, timeout))
    }

    pub fn delete(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.runtime.block_on(self.inner.delete(correlation_id, url, body, timeout))
    }

    pub fn head(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.runtime.block_on(self.inner.head(correlation_id, url, body, timeout))
    }
}
