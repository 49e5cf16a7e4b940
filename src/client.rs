use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::executor::Executor;
use crate::params::{IntoParams, IntoPayload, Params};
use crate::request::{Method, RequestConfig, RequestConfigBuilder, DEFAULT_TIMEOUT};
use crate::response::RequestResult;
use crate::transport::{HttpTransport, Transport, DEFAULT_MAX_IDLE_PER_HOST};

/// Call surface for outbound HTTP requests
///
/// Each method builds one [`RequestConfig`], executes it and returns the
/// buffered result. The correlation id is only written to the log record,
/// never sent.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use httpcall::{Client, Params};
///
/// #[tokio::main]
/// async fn main() -> httpcall::Result<()> {
///     let client = Client::new();
///     let query = Params::new().with("page", 2u32);
///     let result = client
///         .get("req-42", "http://localhost:8080/items", query, Duration::from_millis(300))
///         .await?;
///     println!("{} {}", result.status(), result.body());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    executor: Executor,
    default_timeout: Duration,
}

impl Client {
    /// Create a new client with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Timeout applied by [`request`](Self::request) unless overridden
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Start a request configuration with the client's default timeout
    pub fn request(&self, method: Method, url: &str) -> Result<RequestConfigBuilder> {
        Ok(RequestConfig::builder(method, url)?.timeout(self.default_timeout))
    }

    /// Execute a prepared configuration
    pub async fn execute(&self, correlation_id: &str, config: RequestConfig) -> Result<RequestResult> {
        self.executor.execute(correlation_id, config).await
    }

    /// GET with query parameters appended to the URL
    pub async fn get(
        &self,
        correlation_id: &str,
        url: &str,
        query: impl IntoParams,
        timeout: Duration,
    ) -> Result<RequestResult> {
        let query = query.into_params()?;
        let config = RequestConfig::builder(Method::Get, url)?
            .query(&query)
            .timeout(timeout)
            .build()?;
        self.execute(correlation_id, config).await
    }

    /// POST a scalar verbatim or a mapping as a URL-encoded or multipart form
    pub async fn post(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        headers: Option<Params>,
        timeout: Duration,
        multipart: bool,
    ) -> Result<RequestResult> {
        let options = PostOptions::new(timeout)
            .headers(headers.unwrap_or_default())
            .multipart(multipart);
        self.post_with(correlation_id, url, payload, options).await
    }

    /// Same as [`post`](Self::post), without verifying the server certificate
    pub async fn post_https(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        headers: Option<Params>,
        timeout: Duration,
        multipart: bool,
    ) -> Result<RequestResult> {
        let options = PostOptions::new(timeout)
            .headers(headers.unwrap_or_default())
            .multipart(multipart)
            .insecure_tls(true);
        self.post_with(correlation_id, url, payload, options).await
    }

    /// POST with every option spelled out
    pub async fn post_with(
        &self,
        correlation_id: &str,
        url: &str,
        payload: impl IntoPayload,
        options: PostOptions,
    ) -> Result<RequestResult> {
        let payload = payload.into_payload()?;
        let config = RequestConfig::builder(Method::Post, url)?
            .headers(&options.headers)?
            .payload(payload)
            .timeout(options.timeout)
            .multipart(options.multipart)
            .insecure_tls(options.insecure_tls)
            .keep_alive(options.keep_alive)
            .build()?;
        self.execute(correlation_id, config).await
    }

    /// POST with `query` appended to the URL and `body` URL-encoded
    pub async fn get_then_post(
        &self,
        correlation_id: &str,
        url: &str,
        query: impl IntoParams,
        body: impl IntoParams,
        timeout: Duration,
    ) -> Result<RequestResult> {
        let query = query.into_params()?;
        let body = body.into_params()?;
        let config = RequestConfig::builder(Method::Post, url)?
            .query(&query)
            .payload(body)
            .timeout(timeout)
            .build()?;
        self.execute(correlation_id, config).await
    }

    /// PUT a raw body
    pub async fn put(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.send_raw(correlation_id, Method::Put, url, body, timeout).await
    }

    /// DELETE with a raw body
    pub async fn delete(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.send_raw(correlation_id, Method::Delete, url, body, timeout).await
    }

    /// HEAD with a raw body
    pub async fn head(&self, correlation_id: &str, url: &str, body: &str, timeout: Duration) -> Result<RequestResult> {
        self.send_raw(correlation_id, Method::Head, url, body, timeout).await
    }

    async fn send_raw(
        &self,
        correlation_id: &str,
        method: Method,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<RequestResult> {
        let config = RequestConfig::builder(method, url)?
            .raw_body(body)
            .timeout(timeout)
            .build()?;
        self.execute(correlation_id, config).await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for [`Client::post_with`]
#[derive(Debug, Clone)]
pub struct PostOptions {
    pub headers: Params,
    pub timeout: Duration,
    pub multipart: bool,
    pub insecure_tls: bool,
    pub keep_alive: bool,
}

impl PostOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            headers: Params::new(),
            timeout,
            multipart: false,
            insecure_tls: false,
            keep_alive: false,
        }
    }

    pub fn headers(mut self, headers: Params) -> Self {
        self.headers = headers;
        self
    }

    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    pub fn insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

impl Default for PostOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Builder for creating clients with custom configuration
///
/// # Examples
///
/// ```rust
/// use httpcall::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new()
///     .default_timeout(Duration::from_secs(2))
///     .user_agent("billing/1.0")
///     .build();
/// assert_eq!(client.default_timeout(), Duration::from_secs(2));
/// ```
pub struct ClientBuilder {
    default_timeout: Duration,
    max_idle_per_host: usize,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            user_agent: None,
            transport: None,
        }
    }

    /// Set the timeout used by [`Client::request`]; it also bounds how long
    /// idle keep-alive connections stay pooled
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the cap on idle keep-alive connections per host
    pub fn max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Use a different transport; pool and user agent settings then
    /// belong to that transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Client {
        let transport = self.transport.unwrap_or_else(|| {
            let mut transport = HttpTransport::new()
                .max_idle_per_host(self.max_idle_per_host)
                .pool_idle_timeout(self.default_timeout);
            if let Some(user_agent) = self.user_agent {
                transport = transport.user_agent(user_agent);
            }
            Arc::new(transport)
        });

        Client {
            executor: Executor::new(transport),
            default_timeout: self.default_timeout,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
