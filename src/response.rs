use std::time::Duration;

use serde::Serialize;

/// Outcome of one executed call
///
/// Built once by the executor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestResult {
    status: u16,
    body: String,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
}

impl RequestResult {
    /// Create a result from a status, a fully read body and the elapsed time
    pub fn new(status: u16, body: String, duration: Duration) -> Self {
        Self {
            status,
            body,
            duration,
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the result, keeping only the body
    pub fn into_body(self) -> String {
        self.body
    }

    /// Get the elapsed round-trip time
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Check if the response is successful (2xx status code)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let result = RequestResult::new(201, "ok".to_string(), Duration::from_micros(12_500));
        assert_eq!(result.status(), 201);
        assert_eq!(result.body(), "ok");
        assert_eq!(result.duration_millis(), 12);
        assert!(result.is_success());
        assert!(!RequestResult::new(404, String::new(), Duration::ZERO).is_success());
    }

    #[test]
    fn test_serializes_millis() {
        let result = RequestResult::new(200, "X".to_string(), Duration::from_millis(7));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"status": 200, "body": "X", "duration_ms": 7})
        );
    }
}
