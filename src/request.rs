//! Inbound request surfaces.
//!
//! The router owns parsing; what it hands over is captured in
//! [`RequestSurfaces`]: the bound path values, the raw query pairs, the
//! headers, form pairs and the body. Builders here perform the small amount
//! of parsing the validators rely on (query pairs, form-urlencoded bodies,
//! JSON bodies) without ever discarding a parse failure.

use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// MIME type for URL-encoded form bodies
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// MIME type for multipart form bodies
pub const MULTIPART_FORM: &str = "multipart/form-data";

/// The body of a request as received
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BodyPayload {
    /// No body content
    #[default]
    Absent,
    /// Parsed JSON document
    Json(Value),
    /// The body claimed to be JSON but could not be parsed
    Malformed {
        /// Parser error message
        reason: String,
    },
    /// A body with a content type that is neither JSON nor form encoded
    Unsupported {
        /// Declared content type
        content_type: String,
    },
}

/// Everything the router supplies for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSurfaces {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path parameters as bound by the router, in route order
    ///
    /// Values are usually strings; a router that converts segments itself
    /// may bind numbers or booleans.
    pub path_params: Vec<(String, Value)>,
    /// Raw query pairs, repeated keys preserved
    pub query: Vec<(String, String)>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Form fields, repeated keys preserved
    pub form: Vec<(String, String)>,
    /// Request body
    pub body: BodyPayload,
}

impl RequestSurfaces {
    /// Start from a method and a path; a `?query` suffix is split off and parsed
    pub fn new(method: Method, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), parse_query_pairs(q)),
            None => (path.to_string(), Vec::new()),
        };
        RequestSurfaces {
            method,
            path,
            path_params: Vec::new(),
            query,
            headers: HashMap::new(),
            form: Vec::new(),
            body: BodyPayload::Absent,
        }
    }

    /// Bind a path parameter value
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    /// Append pairs parsed from a raw query string
    #[must_use]
    pub fn with_query_string(mut self, raw: &str) -> Self {
        self.query.extend(parse_query_pairs(raw));
        self
    }

    /// Append one query pair
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set a header; names are stored lowercase
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach an already parsed JSON body
    ///
    /// Sets `content-type: application/json` and a matching `content-length`.
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        let len = body.to_string().len();
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.headers
            .insert("content-length".to_string(), len.to_string());
        self.body = BodyPayload::Json(body);
        self
    }

    /// Attach a raw body and parse it according to its content type
    ///
    /// Form-urlencoded bodies become form pairs and JSON (or an undeclared
    /// type) is parsed as JSON. Anything else is kept as unsupported.
    ///
    /// Multipart bodies are not decoded here: the content type is recorded
    /// and the body is kept as unsupported, so no form pairs appear. Supply
    /// decoded multipart fields with [`RequestSurfaces::with_form_field`].
    #[must_use]
    pub fn with_raw_body(mut self, content_type: Option<&str>, raw: &[u8]) -> Self {
        if let Some(ct) = content_type {
            self.headers
                .insert("content-type".to_string(), ct.to_string());
        }
        self.headers
            .insert("content-length".to_string(), raw.len().to_string());

        let essence = content_type.map(mime_essence);
        match essence.as_deref() {
            Some(FORM_URLENCODED) => {
                self.form.extend(parse_query_pairs(&String::from_utf8_lossy(raw)));
                self.body = BodyPayload::Absent;
            }
            None | Some("application/json") => {
                self.body = parse_json_body(raw);
            }
            Some(ct) if ct.ends_with("+json") => {
                self.body = parse_json_body(raw);
            }
            Some(ct) => {
                self.body = BodyPayload::Unsupported {
                    content_type: ct.to_string(),
                };
            }
        }
        self
    }

    /// Append one form field (as decoded from a multipart body by the router)
    #[must_use]
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the request carries a body
    ///
    /// Per RFC 7230 §3.3 a body is signalled by `Content-Length` or
    /// `Transfer-Encoding`.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.headers.contains_key("content-length") || self.headers.contains_key("transfer-encoding")
    }

    /// Content type without parameters, lowercased
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(mime_essence)
    }

    /// Whether the content type is one of the form encodings
    #[must_use]
    pub fn is_form(&self) -> bool {
        matches!(
            self.content_type().as_deref(),
            Some(FORM_URLENCODED) | Some(MULTIPART_FORM)
        )
    }
}

/// Strip parameters (`; charset=utf-8`) and lowercase a content type
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Parse a query string (or form-urlencoded body) into ordered pairs
///
/// Names and values are URL-decoded; repeated keys are preserved.
pub fn parse_query_pairs(raw: &str) -> Vec<(String, String)> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    debug!(param_count = pairs.len(), "Query pairs parsed");
    pairs
}

/// Parse a JSON body, keeping the failure instead of dropping it
pub fn parse_json_body(raw: &[u8]) -> BodyPayload {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return BodyPayload::Absent;
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(json) => {
            debug!(
                body_fields = json.as_object().map(|o| o.len()),
                "JSON body parsed"
            );
            BodyPayload::Json(json)
        }
        Err(e) => {
            debug!(error = %e, "JSON body parse failed");
            BodyPayload::Malformed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_pairs_keeps_repeats() {
        let q = parse_query_pairs("x=1&y=2&x=3");
        assert_eq!(
            q,
            vec![
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "2".to_string()),
                ("x".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(parse_query_pairs("?a=b%20c")[0].1, "b c");
    }

    #[test]
    fn test_new_splits_query() {
        let req = RequestSurfaces::new(Method::GET, "/pets?status=sold");
        assert_eq!(req.path, "/pets");
        assert_eq!(req.query, vec![("status".to_string(), "sold".to_string())]);
    }

    #[test]
    fn test_has_body_from_headers() {
        let req = RequestSurfaces::new(Method::GET, "/");
        assert!(!req.has_body());
        assert!(req.clone().with_header("Transfer-Encoding", "chunked").has_body());
        assert!(req.with_json_body(json!({"a": 1})).has_body());
    }

    #[test]
    fn test_raw_json_and_malformed() {
        let ok = RequestSurfaces::new(Method::POST, "/")
            .with_raw_body(Some("application/json; charset=utf-8"), br#"{"a":1}"#);
        assert_eq!(ok.body, BodyPayload::Json(json!({"a": 1})));

        let bad = RequestSurfaces::new(Method::POST, "/")
            .with_raw_body(Some("application/json"), b"{not json");
        assert!(matches!(bad.body, BodyPayload::Malformed { .. }));
    }

    #[test]
    fn test_raw_form_body_becomes_fields() {
        let req = RequestSurfaces::new(Method::POST, "/form")
            .with_raw_body(Some("application/x-www-form-urlencoded"), b"a=1&b=2");
        assert!(req.is_form());
        assert_eq!(req.form.len(), 2);
        assert_eq!(req.body, BodyPayload::Absent);
    }

    #[test]
    fn test_unsupported_body() {
        let req = RequestSurfaces::new(Method::POST, "/").with_raw_body(Some("text/plain"), b"hi");
        assert_eq!(
            req.body,
            BodyPayload::Unsupported {
                content_type: "text/plain".into()
            }
        );
    }

    #[test]
    fn test_is_form_ignores_parameters() {
        let req = RequestSurfaces::new(Method::POST, "/")
            .with_header("Content-Type", "multipart/form-data; boundary=xyz");
        assert!(req.is_form());
        assert_eq!(req.content_type().as_deref(), Some(MULTIPART_FORM));
    }
}
