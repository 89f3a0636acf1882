use super::{as_record, Surface, SurfaceValidator};
use crate::error::ValidationError;
use crate::multi_value;
use crate::request::RequestSurfaces;
use crate::schema::Schema;
use crate::validated::Record;
use serde_json::Value;
use tracing::{debug, warn};

/// Validates the query string against an explicit schema
///
/// There is no inference from the handler signature for query parameters.
/// Repeated keys are collapsed by [`multi_value::extract`] first.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    schema: Option<Schema>,
    warn_undeclared: bool,
}

impl QueryValidator {
    #[must_use]
    pub fn new(schema: Option<Schema>) -> Self {
        QueryValidator {
            schema,
            warn_undeclared: true,
        }
    }

    /// Silence the warning for query data that arrives without a schema
    #[must_use]
    pub fn warn_undeclared(mut self, enabled: bool) -> Self {
        self.warn_undeclared = enabled;
        self
    }
}

impl SurfaceValidator for QueryValidator {
    fn surface(&self) -> Surface {
        Surface::Query
    }

    fn validate(&self, req: &RequestSurfaces) -> Result<Option<Record>, ValidationError> {
        let flat = multi_value::extract(req.query.iter().cloned());

        let Some(schema) = &self.schema else {
            if !flat.is_empty() && self.warn_undeclared {
                warn!(
                    surface = "query",
                    path = %req.path,
                    params = ?flat.keys().collect::<Vec<_>>(),
                    "Query parameters were submitted, but no query schema was declared for validation"
                );
            }
            return Ok(None);
        };

        debug!(schema = schema.name(), param_count = flat.len(), "Validating query parameters");
        as_record(Surface::Query, schema, &Value::Object(flat)).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use http::Method;
    use serde_json::json;

    fn query_schema() -> Schema {
        Schema::new(
            "QueryModel",
            json!({
                "type": "object",
                "properties": {
                    "b": {"type": ["integer", "null"], "default": null},
                    "arr": {"type": "array", "items": {"type": "integer"}},
                    "x": {"type": "string"}
                },
                "required": ["x"]
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_multi_value_and_scalar() {
        let req = RequestSurfaces::new(Method::GET, "/query?x=hi&b=3&arr=1&arr=2");
        let rec = QueryValidator::new(Some(query_schema()))
            .validate(&req)
            .unwrap()
            .unwrap();
        assert_eq!(rec.to_value(), json!({"x": "hi", "b": 3, "arr": [1, 2]}));
    }

    #[test]
    fn test_single_value_for_list_field() {
        let req = RequestSurfaces::new(Method::GET, "/query?x=hi&arr=5");
        let rec = QueryValidator::new(Some(query_schema()))
            .validate(&req)
            .unwrap()
            .unwrap();
        assert_eq!(rec.get("arr"), Some(&json!([5])));
        assert_eq!(rec.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_required_field_missing() {
        let req = RequestSurfaces::new(Method::GET, "/query");
        let err = QueryValidator::new(Some(query_schema()))
            .validate(&req)
            .unwrap_err();
        assert_eq!(err.violations()[0].field, "x");
        assert_eq!(err.violations()[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_no_schema_returns_none() {
        let req = RequestSurfaces::new(Method::GET, "/query?x=1");
        assert!(QueryValidator::new(None).validate(&req).unwrap().is_none());
        let empty = RequestSurfaces::new(Method::GET, "/query");
        assert!(QueryValidator::new(None).validate(&empty).unwrap().is_none());
    }
}
