//! Route validation files and request fixtures.
//!
//! A route file declares the schemas and parameter types of one route in
//! YAML or JSON:
//!
//! ```yaml
//! name: get_pet
//! path_schema:
//!   type: object
//!   properties:
//!     petId: { type: integer }
//! signature: { petId: int }
//! mode: combined
//! ```
//!
//! A request fixture describes one inbound request as the router would hand
//! it over. Both are used by the `reqcheck` CLI and by integration tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{bail, Context};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::{validate_body, validate_form, validate_query, Validate};
use crate::pipeline::ValidationPipeline;
use crate::request::{RequestSurfaces, MULTIPART_FORM};
use crate::runtime_config::RuntimeConfig;
use crate::schema::Schema;
use crate::signature::HandlerSignature;
use crate::validator::PathValidator;

/// Which validators a route file asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// Path, query and body or form in one pass
    #[default]
    Combined,
    Path,
    Query,
    Body,
    Form,
}

/// Declared validation for one route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteValidation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_schema: Option<Value>,
    /// Parameter name → type name (`int`, `list[str]`, `uuid?`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signature: BTreeMap<String, String>,
    #[serde(default)]
    pub mode: RouteMode,
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Read a YAML (`.yaml`/`.yml`) or JSON file into `T`
fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    Ok(parsed)
}

impl RouteValidation {
    /// Load a route file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not describe a route.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        load_file(path.as_ref())
    }

    fn schema_name(&self, surface: &str) -> String {
        let base = if self.name.is_empty() { "route" } else { &self.name };
        format!("{base}.{surface}")
    }

    /// Compile one declared schema, named `<route>.<surface>`
    ///
    /// # Errors
    ///
    /// Fails when the schema document does not compile.
    pub fn compile(
        &self,
        surface: &str,
        document: Option<&Value>,
        config: &RuntimeConfig,
    ) -> anyhow::Result<Option<Schema>> {
        document
            .map(|doc| {
                Schema::with_formats(self.schema_name(surface), doc.clone(), config.validate_formats)
            })
            .transpose()
            .with_context(|| format!("route '{}': {surface} schema does not compile", self.name))
    }

    /// Parse the textual signature table
    ///
    /// # Errors
    ///
    /// Fails on the first unknown type name.
    pub fn handler_signature(&self) -> anyhow::Result<HandlerSignature> {
        HandlerSignature::parse(self.signature.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .with_context(|| format!("route '{}': invalid signature", self.name))
    }

    /// Compile the declaration into a pipeline
    ///
    /// # Errors
    ///
    /// Fails when a schema does not compile, a type name is unknown, or a
    /// single-surface mode lacks its schema.
    pub fn pipeline(&self, config: &RuntimeConfig) -> anyhow::Result<ValidationPipeline> {
        let path = self.compile("path", self.path_schema.as_ref(), config)?;
        let query = self.compile("query", self.query_schema.as_ref(), config)?;
        let body = self.compile("body", self.body_schema.as_ref(), config)?;
        let form = self.compile("form", self.form_schema.as_ref(), config)?;
        let signature = self.handler_signature()?;

        let pipeline = match self.mode {
            RouteMode::Combined => {
                let mut v = Validate::new().with_config(*config).signature(signature);
                if let Some(s) = path {
                    v = v.path(s);
                }
                if let Some(s) = query {
                    v = v.query(s);
                }
                if let Some(s) = body {
                    v = v.body(s);
                }
                if let Some(s) = form {
                    v = v.form(s);
                }
                v.build()
            }
            RouteMode::Path => ValidationPipeline::single(
                PathValidator::required(path, signature)
                    .validate_formats(config.validate_formats),
            ),
            RouteMode::Query => match query {
                Some(s) => validate_query(s),
                None => bail!("route '{}': mode 'query' requires query_schema", self.name),
            },
            RouteMode::Body => match body {
                Some(s) => validate_body(s),
                None => bail!("route '{}': mode 'body' requires body_schema", self.name),
            },
            RouteMode::Form => match form {
                Some(s) => validate_form(s),
                None => bail!("route '{}': mode 'form' requires form_schema", self.name),
            },
        };
        Ok(pipeline)
    }
}

/// One inbound request, as the router would hand it over
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFixture {
    /// HTTP method, default `GET`
    #[serde(default)]
    pub method: Option<String>,
    /// Request path, default `/`
    #[serde(default)]
    pub path: Option<String>,
    /// Values bound by the router, kept with their bound JSON type
    #[serde(default)]
    pub path_params: Map<String, Value>,
    /// Raw query string without the leading `?`
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Raw body text
    #[serde(default)]
    pub body: Option<String>,
    /// Raw urlencoded form fields, for requests the framework already decoded
    #[serde(default)]
    pub form: Option<String>,
}

impl RequestFixture {
    /// Load a request fixture
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        load_file(path.as_ref())
    }

    /// Build the request surfaces
    ///
    /// The body is attached only when the headers signal one; its content
    /// type decides whether it is parsed as JSON or as form fields.
    ///
    /// # Errors
    ///
    /// Fails on an invalid HTTP method, or on a raw multipart `body`, which
    /// is never decoded; multipart fields belong in `form`.
    pub fn to_surfaces(&self) -> anyhow::Result<RequestSurfaces> {
        let method = match &self.method {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{m}'"))?,
            None => Method::GET,
        };
        let mut req = RequestSurfaces::new(method, self.path.as_deref().unwrap_or("/"));
        for (name, value) in &self.path_params {
            req = req.with_path_param(name.clone(), value.clone());
        }
        if let Some(query) = &self.query {
            req = req.with_query_string(query.trim_start_matches('?'));
        }
        for (name, value) in &self.headers {
            req = req.with_header(name, value.clone());
        }
        if let Some(form) = &self.form {
            for (name, value) in crate::request::parse_query_pairs(form) {
                req = req.with_form_field(name, value);
            }
        }
        if let Some(body) = &self.body {
            if req.has_body() {
                if req.content_type().as_deref() == Some(MULTIPART_FORM) {
                    bail!(
                        "raw multipart bodies are not decoded; supply the fields through `form`"
                    );
                }
                let content_type = req.header("content-type").map(str::to_string);
                req = req.with_raw_body(content_type.as_deref(), body.as_bytes());
            }
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Surface;
    use serde_json::json;

    fn route(yaml: &str) -> RouteValidation {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_route_yaml() {
        let r = route(
            "name: get_pet\nsignature: { petId: int }\npath_schema:\n  type: object\n",
        );
        assert_eq!(r.name, "get_pet");
        assert_eq!(r.mode, RouteMode::Combined);
        assert_eq!(r.signature["petId"], "int");
        assert!(r.path_schema.is_some());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_yaml::from_str::<RouteValidation>("name: x\nbogus: 1\n").is_err());
    }

    #[test]
    fn test_pipeline_surfaces_by_mode() {
        let cfg = RuntimeConfig::default();
        let combined = route("name: a\nform_schema: { type: object }\n").pipeline(&cfg).unwrap();
        assert_eq!(
            combined.surfaces(),
            [Surface::Path, Surface::Query, Surface::Form]
        );
        let single = route("name: a\nmode: query\nquery_schema: { type: object }\n")
            .pipeline(&cfg)
            .unwrap();
        assert_eq!(single.surfaces(), [Surface::Query]);
    }

    #[test]
    fn test_mode_without_schema_fails() {
        let err = route("name: a\nmode: body\n")
            .pipeline(&RuntimeConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("requires body_schema"));
    }

    #[test]
    fn test_bad_signature_fails() {
        let err = route("name: a\nsignature: { id: complex }\n")
            .pipeline(&RuntimeConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid signature"));
    }

    #[test]
    fn test_fixture_to_surfaces() {
        let fixture: RequestFixture = serde_json::from_value(json!({
            "method": "post",
            "path": "/pets/7",
            "path_params": {"petId": "7"},
            "query": "tag=a&tag=b",
            "headers": {"Content-Type": "application/json", "Content-Length": "14"},
            "body": "{\"name\":\"x\"}"
        }))
        .unwrap();
        let req = fixture.to_surfaces().unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path_params, vec![("petId".to_string(), json!("7"))]);
        assert_eq!(req.query.len(), 2);
        assert!(matches!(req.body, crate::request::BodyPayload::Json(_)));
    }

    #[test]
    fn test_fixture_body_without_signal_is_ignored() {
        let fixture = RequestFixture {
            body: Some("{\"a\": 1}".into()),
            ..RequestFixture::default()
        };
        let req = fixture.to_surfaces().unwrap();
        assert!(matches!(req.body, crate::request::BodyPayload::Absent));
    }

    #[test]
    fn test_fixture_raw_multipart_body_rejected() {
        let fixture: RequestFixture = serde_json::from_value(json!({
            "method": "POST",
            "headers": {
                "content-type": "multipart/form-data; boundary=x",
                "content-length": "40"
            },
            "body": "--x\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--x--"
        }))
        .unwrap();
        let err = fixture.to_surfaces().unwrap_err();
        assert!(err.to_string().contains("supply the fields through `form`"), "{err}");

        let fixture: RequestFixture = serde_json::from_value(json!({
            "method": "POST",
            "headers": {"content-type": "multipart/form-data; boundary=x"},
            "form": "a=1"
        }))
        .unwrap();
        let req = fixture.to_surfaces().unwrap();
        assert!(req.is_form());
        assert_eq!(req.form, vec![("a".to_string(), "1".to_string())]);
    }
}
