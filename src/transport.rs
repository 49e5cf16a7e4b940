use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Request as ReqwestRequest, Response as ReqwestResponse};

use crate::error::{Error, Result};
use crate::tls::TlsMode;

/// Idle connections kept per host when keep-alive is on
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 20;

/// How long a reusable connection may sit idle in the pool
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call transport settings
///
/// Calls with equal options share one pooled client. The per-call deadline
/// is not part of the key; it travels on the request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransportOptions {
    /// Keep idle connections for reuse
    pub keep_alive: bool,
    /// Certificate verification policy
    pub tls: TlsMode,
}

/// Transport trait for HTTP operations
///
/// The executor only needs "send a request, receive a response"; connection
/// pooling, TLS and framing live behind this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response
    async fn send(&self, request: ReqwestRequest, options: TransportOptions) -> Result<ReqwestResponse>;

    /// Get the transport name/type
    fn name(&self) -> &str;
}

/// Default HTTP transport implementation using reqwest
///
/// Holds one reqwest client per distinct [`TransportOptions`], created on
/// first use, so there are at most four. The mutex only guards the map; the
/// pools themselves are synchronised by reqwest.
pub struct HttpTransport {
    clients: Mutex<HashMap<TransportOptions, ReqwestClient>>,
    max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    user_agent: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the cap on idle connections per host for keep-alive clients
    pub fn max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Set how long idle keep-alive connections are retained
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set the user agent sent by every client
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Get (or build) the client for an option set
    pub fn client_for(&self, options: TransportOptions) -> Result<ReqwestClient> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&options) {
            return Ok(client.clone());
        }
        let client = self.build_client(options)?;
        tracing::debug!(
            keep_alive = options.keep_alive,
            tls_verify = options.tls.is_verify_enabled(),
            "created pooled http client"
        );
        clients.insert(options, client.clone());
        Ok(client)
    }

    /// Number of distinct clients built so far
    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn build_client(&self, options: TransportOptions) -> Result<ReqwestClient> {
        let mut builder = ReqwestClient::builder();
        builder = if options.keep_alive {
            builder
                .pool_idle_timeout(self.pool_idle_timeout)
                .pool_max_idle_per_host(self.max_idle_per_host)
        } else {
            builder.pool_max_idle_per_host(0)
        };
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        options
            .tls
            .apply_to_builder(builder)
            .build()
            .map_err(Error::Transport)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ReqwestRequest, options: TransportOptions) -> Result<ReqwestResponse> {
        let client = self.client_for(options)?;
        client.execute(request).await.map_err(Error::Transport)
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
