use thiserror::Error;

/// Result type for httpcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error surfaced by every call
///
/// Nothing is retried or suppressed internally; each variant reaches the
/// immediate caller exactly once.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter value is not one of the supported scalar kinds
    #[error("Unsupported parameter type: {0}")]
    UnsupportedType(String),

    /// Method, URL or headers cannot form a valid request
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Connection, TLS or timeout failure while sending
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response arrived but its body could not be read in full
    #[error("Failed to read response body (status {status}): {source}")]
    ReadBody {
        status: u16,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// Create a new unsupported type error
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Error::UnsupportedType(kind.into())
    }

    /// Create a new malformed request error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedRequest(message.into())
    }

    /// Check if this error was caused by the call's deadline expiring
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout(),
            Error::ReadBody { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is an unsupported type error
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Error::UnsupportedType(_))
    }

    /// Status code known at the time of failure.
    ///
    /// Only `ReadBody` carries one: the status line arrived before the body
    /// failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ReadBody { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::MalformedRequest(format!("Invalid URL: {}", err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::MalformedRequest(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::MalformedRequest(format!("Invalid header value: {}", err))
    }
}
