//! Turning validation failures into HTTP responses.

use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ValidationError;

/// Response produced for a request that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    pub body: Value,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl ErrorResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        ErrorResponse { status, body }
    }

    /// Convert into an `http::Response` carrying the JSON body
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut res = http::Response::new(self.body.to_string().into_bytes());
        *res.status_mut() = self.status;
        res.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        res
    }
}

/// Renders a [`ValidationError`] for the client
///
/// Implemented for any `Fn(&ValidationError) -> ErrorResponse`, so services
/// can swap in their own envelope with a closure.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, err: &ValidationError) -> ErrorResponse;
}

impl<F> ErrorHandler for F
where
    F: Fn(&ValidationError) -> ErrorResponse + Send + Sync,
{
    fn handle(&self, err: &ValidationError) -> ErrorResponse {
        self(err)
    }
}

/// The stock JSON envelope
///
/// ```json
/// {"error": "Request validation failed", "category": "field", "surface": "path",
///  "details": [{"field": "petId", "message": "...", "kind": "type"}]}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, err: &ValidationError) -> ErrorResponse {
        let title = match err {
            ValidationError::Fields { .. } => "Request validation failed".to_string(),
            // Route setup bugs are not the client's business.
            ValidationError::MissingPathParams => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        let mut body = json!({
            "error": title,
            "category": err.category(),
        });
        if let Some(surface) = err.surface() {
            body["surface"] = json!(surface);
        }
        if !err.violations().is_empty() {
            body["details"] = json!(err.violations());
        }
        ErrorResponse::new(err.status(), body)
    }
}
