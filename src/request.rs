use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::header::{HeaderName, CONNECTION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use reqwest::Request as ReqwestRequest;
use url::Url;

use crate::error::{Error, Result};
use crate::multipart::MultipartForm;
use crate::params::{Params, Payload};
use crate::tls::TlsMode;
use crate::transport::TransportOptions;

/// Content type sent with POST bodies unless multipart encoding is chosen
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default round-trip timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP methods supported by the call surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Head,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Head => "HEAD",
            Method::Delete => "DELETE",
        }
    }

    /// Convert to the `http` crate's method type
    pub fn to_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Head => http::Method::HEAD,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "HEAD" => Ok(Method::Head),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::malformed(format!("Unsupported method: {}", other))),
        }
    }
}

/// Immutable configuration of one outbound call
///
/// Produced by [`RequestConfigBuilder::build`] and consumed by
/// [`Executor::execute`](crate::executor::Executor::execute).
#[derive(Debug, Clone)]
pub struct RequestConfig {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    content_type: String,
    timeout: Duration,
    keep_alive: bool,
    insecure_tls: bool,
    multipart: bool,
}

impl RequestConfig {
    /// Start building a request against an absolute URL
    pub fn builder(method: Method, url: &str) -> Result<RequestConfigBuilder> {
        let url = Url::parse(url)?;
        RequestConfigBuilder::new(method, url)
    }

    /// Start building a request from a host and a path joined verbatim
    pub fn builder_for_host(method: Method, host: &str, path: &str) -> Result<RequestConfigBuilder> {
        let url = match (host.ends_with('/'), path.starts_with('/')) {
            (true, true) => format!("{}{}", host, &path[1..]),
            (false, false) if !path.is_empty() => format!("{}/{}", host, path),
            _ => format!("{}{}", host, path),
        };
        Self::builder(method, &url)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Caller-supplied headers, applied after the defaults
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn is_insecure_tls(&self) -> bool {
        self.insecure_tls
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    /// Transport settings this call needs
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            keep_alive: self.keep_alive,
            tls: TlsMode::from_insecure(self.insecure_tls),
        }
    }

    /// Convert to a reqwest request.
    ///
    /// Header precedence, lowest first: `Connection: Keep-Alive`, the POST
    /// content type, then caller headers.
    pub fn into_reqwest_request(self) -> Result<ReqwestRequest> {
        let mut request = ReqwestRequest::new(self.method.to_http(), self.url);
        *request.timeout_mut() = Some(self.timeout);

        let headers = request.headers_mut();
        if self.keep_alive {
            headers.insert(CONNECTION, HeaderValue::from_static("Keep-Alive"));
        }
        if self.method == Method::Post {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(&self.content_type)?);
        }
        for (name, value) in self.headers {
            if let Some(name) = name {
                headers.insert(name, value);
            }
        }

        if !self.body.is_empty() {
            *request.body_mut() = Some(self.body.into());
        }

        Ok(request)
    }
}

/// Builder for [`RequestConfig`]
///
/// Body encoding happens in [`build`](Self::build), so parameter and flag
/// setters may be called in any order.
#[derive(Debug)]
pub struct RequestConfigBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    payload: Option<Payload>,
    content_type: String,
    timeout: Duration,
    keep_alive: bool,
    insecure_tls: bool,
    multipart: bool,
}

impl RequestConfigBuilder {
    fn new(method: Method, url: Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::malformed(format!("Unsupported URL scheme: {}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(Error::malformed(format!("URL has no host: {}", url)));
        }
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            payload: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            keep_alive: false,
            insecure_tls: false,
            multipart: false,
        })
    }

    /// Set a header, replacing any same-named header
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name.parse::<HeaderName>()?;
        let value = value.parse::<HeaderValue>()?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set every entry of a mapping as a header
    pub fn headers(mut self, headers: &Params) -> Result<Self> {
        for (name, value) in headers.iter() {
            let name = name.parse::<HeaderName>()?;
            let value = HeaderValue::from_bytes(&value.to_bytes())?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Append query parameters to the URL
    pub fn query(mut self, params: &Params) -> Self {
        params.append_to_url(&mut self.url);
        self
    }

    /// Set the body input
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set a raw body sent verbatim
    pub fn raw_body(self, body: impl Into<String>) -> Self {
        self.payload(Payload::from(body.into()))
    }

    /// Override the default POST content type
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Set the round-trip timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow connection reuse, bounded by the timeout
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Skip certificate verification for this call
    pub fn insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    /// Encode mapping payloads as multipart/form-data
    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    /// Encode the payload and freeze the configuration
    pub fn build(self) -> Result<RequestConfig> {
        let mut content_type = self.content_type;
        let mut multipart = false;
        let body = match self.payload {
            None => Vec::new(),
            Some(Payload::Scalar(param)) => param.to_bytes().into_owned(),
            Some(Payload::Map(params)) if self.multipart => {
                let form = MultipartForm::from_params(&params).finish()?;
                content_type = form.content_type();
                multipart = true;
                form.body
            }
            Some(Payload::Map(params)) => params.to_form_urlencoded().into_bytes(),
        };

        Ok(RequestConfig {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body,
            content_type,
            timeout: self.timeout,
            keep_alive: self.keep_alive,
            insecure_tls: self.insecure_tls,
            multipart,
        })
    }
}
