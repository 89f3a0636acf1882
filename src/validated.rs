//! The per-request container of validated surfaces.

use crate::ids::RequestId;
use crate::validator::Surface;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A validated record: ordered field name → value, tagged with the schema
/// that produced it
///
/// Path parameters validated without an explicit schema are wrapped in a
/// record named [`Record::SYNTHESIZED_PATH`], so a handler always receives
/// the same container shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    #[serde(skip)]
    schema: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Name given to records synthesized from per-field path validation
    pub const SYNTHESIZED_PATH: &'static str = "PathParams";

    pub fn new(schema: impl Into<String>, fields: Map<String, Value>) -> Self {
        Record {
            schema: schema.into(),
            fields,
        }
    }

    /// Name of the schema this record satisfied
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Deserialize the record into a handler-defined type
    ///
    /// # Errors
    ///
    /// Returns the serde error when the record does not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    /// Plain JSON object holding the fields
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Validated data for one request
///
/// Created fresh for every request and populated only by the validators that
/// actually ran; a surface that was not validated stays `None`. `headers` and
/// `cookies` are reserved and never filled today.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedRequest {
    request_id: RequestId,
    pub path_params: Option<Record>,
    pub query_params: Option<Record>,
    pub body: Option<Record>,
    pub form: Option<Record>,
    pub headers: Option<Record>,
    pub cookies: Option<Record>,
}

impl ValidatedRequest {
    /// An empty context with a new request id
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty context bound to an existing request id
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        ValidatedRequest {
            request_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Record for a surface
    #[must_use]
    pub fn get(&self, surface: Surface) -> Option<&Record> {
        match surface {
            Surface::Path => self.path_params.as_ref(),
            Surface::Query => self.query_params.as_ref(),
            Surface::Body => self.body.as_ref(),
            Surface::Form => self.form.as_ref(),
        }
    }

    /// Store the outcome of one surface validator
    pub fn set(&mut self, surface: Surface, record: Option<Record>) {
        let slot = match surface {
            Surface::Path => &mut self.path_params,
            Surface::Query => &mut self.query_params,
            Surface::Body => &mut self.body,
            Surface::Form => &mut self.form,
        };
        *slot = record;
    }

    /// Populated surfaces as plain data, keyed `path_params`, `query_params`,
    /// `body`, `form`
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let slots = [
            ("path_params", &self.path_params),
            ("query_params", &self.query_params),
            ("body", &self.body),
            ("form", &self.form),
            ("headers", &self.headers),
            ("cookies", &self.cookies),
        ];
        for (key, slot) in slots {
            if let Some(record) = slot {
                out.insert(key.to_string(), record.to_value());
            }
        }
        out
    }

    /// [`to_map`](Self::to_map) as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Fetch the context installed in a request's extensions
    #[must_use]
    pub fn from_extensions(extensions: &http::Extensions) -> Option<&ValidatedRequest> {
        extensions.get::<ValidatedRequest>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn record(v: Value) -> Record {
        match v {
            Value::Object(m) => Record::new("T", m),
            _ => Record::new("T", Map::new()),
        }
    }

    #[test]
    fn test_to_map_only_populated() {
        let mut vr = ValidatedRequest::new();
        assert!(vr.to_map().is_empty());
        vr.set(Surface::Path, Some(record(json!({"petId": 7}))));
        assert_eq!(vr.to_json(), json!({"path_params": {"petId": 7}}));
        assert!(vr.get(Surface::Body).is_none());
    }

    #[test]
    fn test_nested_values_rendered_as_plain_data() {
        let mut vr = ValidatedRequest::new();
        vr.set(
            Surface::Body,
            Some(record(json!({"category": {"id": 1}, "tags": [{"name": "a"}]}))),
        );
        assert_eq!(
            vr.to_json()["body"],
            json!({"category": {"id": 1}, "tags": [{"name": "a"}]})
        );
    }

    #[test]
    fn test_record_parse_into_type() {
        #[derive(Deserialize)]
        struct PetPath {
            #[serde(rename = "petId")]
            pet_id: i64,
        }
        let r = record(json!({"petId": 7}));
        let p: PetPath = r.parse().unwrap();
        assert_eq!(p.pet_id, 7);
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"petId": 7}));
    }

    #[test]
    fn test_each_instance_has_own_id() {
        assert_ne!(
            ValidatedRequest::new().request_id(),
            ValidatedRequest::new().request_id()
        );
    }
}
