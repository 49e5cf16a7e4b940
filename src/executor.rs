//! Request execution
//!
//! One call is a straight line: build the transport request, send it, buffer
//! the body, report. Each step's failure ends the call and is returned as is;
//! there is no retry anywhere.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::request::RequestConfig;
use crate::response::RequestResult;
use crate::transport::{HttpTransport, Transport};

/// Bytes of response body kept in the per-call log record
pub const LOG_BODY_LIMIT: usize = 512;

/// Executes request configurations against a shared transport
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
}

impl Executor {
    /// Create an executor over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Run one call to completion.
    ///
    /// The reported duration covers the transport round trip, from just
    /// before the request is handed over until the response head arrives.
    /// The response is dropped, releasing its connection, whether or not
    /// its body could be read. On [`Error::ReadBody`] the status stays
    /// available through [`Error::status`].
    pub async fn execute(&self, correlation_id: &str, config: RequestConfig) -> Result<RequestResult> {
        let method = config.method();
        let url = config.url().clone();
        let options = config.transport_options();

        let request = match config.into_reqwest_request() {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    method = %method,
                    url = %url,
                    error = %err,
                    "http request could not be built"
                );
                return Err(err);
            }
        };

        let start = Instant::now();
        let sent = self.transport.send(request, options).await;
        let elapsed = start.elapsed();

        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %method,
                    url = %url,
                    duration_ms = millis(elapsed),
                    timed_out = err.is_timeout(),
                    error = %err,
                    "http call failed"
                );
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(bytes) => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                tracing::info!(
                    correlation_id = %correlation_id,
                    method = %method,
                    url = %url,
                    status,
                    duration_ms = millis(elapsed),
                    body = %truncate(&body, LOG_BODY_LIMIT),
                    "http call completed"
                );
                Ok(RequestResult::new(status, body, elapsed))
            }
            Err(source) => {
                let err = Error::ReadBody { status, source };
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %method,
                    url = %url,
                    status,
                    duration_ms = millis(elapsed),
                    error = %err,
                    "http response body could not be read"
                );
                Err(err)
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Cut `text` to at most `limit` bytes on a char boundary
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
