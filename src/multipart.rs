use std::io::{self, Cursor, Write};

use ::multipart::client::{HttpRequest, HttpStream, Multipart};

use crate::error::{Error, Result};
use crate::params::{Param, Params};

/// Multipart form data body
///
/// Fields are written in insertion order as `form-data` parts through the
/// `multipart` crate's client writer. Each form gets its own boundary; the
/// content type returned by [`MultipartForm::finish`] carries it and must be
/// sent as the request's `Content-Type`.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, Param)>,
}

/// Boundary and body bytes of an encoded form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedForm {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl EncodedForm {
    /// `multipart/form-data; boundary=...`
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

impl MultipartForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a form holding one field per mapping entry
    pub fn from_params(params: &Params) -> Self {
        params
            .iter()
            .fold(Self::new(), |form, (name, value)| form.add_field(name, value.clone()))
    }

    /// Add a field
    pub fn add_field(mut self, name: &str, value: impl Into<Param>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// Get the number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Write the envelope into memory.
    ///
    /// Text and numbers become plain fields. Bytes that are not valid UTF-8
    /// are written as an `application/octet-stream` part. An empty form still
    /// yields the closing delimiter.
    pub fn finish(self) -> Result<EncodedForm> {
        let mut writer = Multipart::from_request(BufferedRequest::default()).map_err(encode_error)?;
        for (name, value) in self.fields {
            let written = match String::from_utf8(value.to_bytes().into_owned()) {
                Ok(text) => writer.write_text(&name, text),
                Err(err) => writer.write_stream(&name, &mut Cursor::new(err.into_bytes()), None, None),
            };
            written.map_err(encode_error)?;
        }
        let buffer = writer.send().map_err(encode_error)?;
        Ok(EncodedForm {
            boundary: buffer.boundary,
            body: buffer.body,
        })
    }
}

fn encode_error(err: io::Error) -> Error {
    Error::malformed(format!("multipart encoding failed: {}", err))
}

/// Request half of the in-memory sink; records the boundary the writer picks.
#[derive(Default)]
struct BufferedRequest {
    boundary: String,
}

impl HttpRequest for BufferedRequest {
    type Stream = BufferedBody;
    type Error = io::Error;

    fn apply_headers(&mut self, boundary: &str, _content_len: Option<u64>) -> bool {
        self.boundary = boundary.to_string();
        true
    }

    fn open_stream(self) -> io::Result<BufferedBody> {
        Ok(BufferedBody {
            boundary: self.boundary,
            body: Vec::new(),
        })
    }
}

struct BufferedBody {
    boundary: String,
    body: Vec<u8>,
}

impl Write for BufferedBody {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl HttpStream for BufferedBody {
    type Request = BufferedRequest;
    type Response = BufferedBody;
    type Error = io::Error;

    fn finish(self) -> io::Result<BufferedBody> {
        Ok(self)
    }
}
