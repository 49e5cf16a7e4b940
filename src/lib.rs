//! httpcall - a uniform call surface for outbound HTTP requests
//!
//! Every call builds one immutable [`RequestConfig`], sends it through a
//! pooled transport, buffers the whole response body and emits a single
//! structured log record carrying the caller's correlation id, the elapsed
//! time and the outcome.
//!
//! ## Features
//!
//! - **GET, POST, PUT, HEAD and DELETE** with per-call timeouts
//! - **URL-encoded and multipart** encoding of typed parameters
//! - **Keep-alive** pooling, capped at 20 idle connections per host
//! - **Opt-in TLS bypass** for HTTPS targets
//! - **Async and blocking** call surfaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use httpcall::{Client, Params};
//!
//! #[tokio::main]
//! async fn main() -> httpcall::Result<()> {
//!     let client = Client::new();
//!     let form = Params::new().with("user", "ada").with("age", 36u8);
//!     let result = client
//!         .post("req-1", "http://localhost:8080/users", form, None, Duration::from_secs(1), false)
//!         .await?;
//!
//!     println!("Status: {}", result.status());
//!     println!("Body: {}", result.body());
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod client;
pub mod error;
pub mod executor;
pub mod multipart;
pub mod params;
pub mod request;
pub mod response;
pub mod tls;
pub mod transport;

// Re-export main types for convenience
pub use client::{Client, ClientBuilder, PostOptions};
pub use error::{Error, Result};
pub use executor::Executor;
pub use self::multipart::{EncodedForm, MultipartForm};
pub use params::{IntoParams, IntoPayload, Param, Params, Payload};
pub use request::{Method, RequestConfig, RequestConfigBuilder, DEFAULT_CONTENT_TYPE, DEFAULT_TIMEOUT};
pub use response::RequestResult;
pub use tls::TlsMode;
pub use transport::{HttpTransport, Transport, TransportOptions};

// Re-export URL types
pub use url::Url;

// Re-export time types
pub use std::time::Duration;
