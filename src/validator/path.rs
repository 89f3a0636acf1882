use super::{as_record, Surface, SurfaceValidator};
use crate::error::ValidationError;
use crate::request::RequestSurfaces;
use crate::schema::Schema;
use crate::signature::HandlerSignature;
use crate::validated::Record;
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Validates the values the router bound to path segments
///
/// With an explicit schema the bound mapping is validated as a whole.
/// Without one, every value is validated on its own against the type the
/// handler declared for it (or the type the router bound it as) and the
/// results are wrapped into a synthesized `PathParams` record.
#[derive(Debug, Clone)]
pub struct PathValidator {
    schema: Option<Schema>,
    signature: HandlerSignature,
    require_params: bool,
    validate_formats: bool,
}

impl PathValidator {
    /// Validator used by the combined pipeline: a route without path
    /// parameters simply yields no record.
    #[must_use]
    pub fn new(schema: Option<Schema>, signature: HandlerSignature) -> Self {
        PathValidator {
            schema,
            signature,
            require_params: false,
            validate_formats: true,
        }
    }

    /// Validator for routes that must bind path parameters; a request
    /// without any is reported as [`ValidationError::MissingPathParams`].
    #[must_use]
    pub fn required(schema: Option<Schema>, signature: HandlerSignature) -> Self {
        PathValidator {
            schema,
            signature,
            require_params: true,
            validate_formats: true,
        }
    }

    /// Whether `format` is asserted on values checked against the handler
    /// signature. An explicit schema carries its own setting.
    #[must_use]
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    fn validate_from_signature(
        &self,
        params: &[(String, Value)],
    ) -> Result<Record, ValidationError> {
        let mut fields = Map::with_capacity(params.len());
        let mut violations = Vec::new();
        for (name, value) in params {
            let target = self.signature.target_type(name, value);
            debug!(param = %name, target_type = %target, "Validating path parameter");
            match target.validate_with_formats(name, value, self.validate_formats) {
                Ok(v) => {
                    fields.insert(name.clone(), v);
                }
                Err(errs) => violations.extend(errs),
            }
        }
        if violations.is_empty() {
            Ok(Record::new(Record::SYNTHESIZED_PATH, fields))
        } else {
            Err(ValidationError::fields(Surface::Path, violations))
        }
    }
}

impl SurfaceValidator for PathValidator {
    fn surface(&self) -> Surface {
        Surface::Path
    }

    fn validate(&self, req: &RequestSurfaces) -> Result<Option<Record>, ValidationError> {
        if req.path_params.is_empty() {
            if self.require_params {
                error!(
                    path = %req.path,
                    "Path validation required but the route binds no path parameters"
                );
                return Err(ValidationError::MissingPathParams);
            }
            return Ok(None);
        }

        match &self.schema {
            Some(schema) => {
                let raw: Map<String, Value> = req.path_params.iter().cloned().collect();
                as_record(Surface::Path, schema, &Value::Object(raw)).map(Some)
            }
            None => self.validate_from_signature(&req.path_params).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::schema::FieldType;
    use http::Method;
    use serde_json::json;

    fn item_request(id: impl Into<Value>) -> RequestSurfaces {
        RequestSurfaces::new(Method::GET, "/items/x").with_path_param("id", id)
    }

    #[test]
    fn test_declared_integer_is_coerced() {
        let v = PathValidator::new(None, HandlerSignature::new().param("id", FieldType::Integer));
        let rec = v.validate(&item_request("42")).unwrap().unwrap();
        assert_eq!(rec.get("id"), Some(&json!(42)));
        assert_eq!(rec.schema(), Record::SYNTHESIZED_PATH);
    }

    #[test]
    fn test_bad_value_names_field() {
        let v = PathValidator::new(None, HandlerSignature::new().param("id", FieldType::Integer));
        let err = v.validate(&item_request("abc")).unwrap_err();
        assert_eq!(err.surface(), Some(Surface::Path));
        assert_eq!(err.violations()[0].field, "id");
        assert_eq!(err.violations()[0].kind, ViolationKind::Type);
    }

    #[test]
    fn test_undeclared_keeps_router_type() {
        let v = PathValidator::new(None, HandlerSignature::new());
        let req = RequestSurfaces::new(Method::GET, "/x")
            .with_path_param("a", "text")
            .with_path_param("b", 5);
        let rec = v.validate(&req).unwrap().unwrap();
        assert_eq!(rec.get("a"), Some(&json!("text")));
        assert_eq!(rec.get("b"), Some(&json!(5)));
    }

    #[test]
    fn test_explicit_schema_wins() {
        let schema = Schema::new(
            "PathModel",
            json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }),
        )
        .unwrap();
        let v = PathValidator::new(Some(schema), HandlerSignature::new().param("id", FieldType::String));
        let rec = v.validate(&item_request("42")).unwrap().unwrap();
        assert_eq!(rec.get("id"), Some(&json!(42)));
        assert_eq!(rec.schema(), "PathModel");
    }

    #[test]
    fn test_no_params_is_not_an_error() {
        let v = PathValidator::new(None, HandlerSignature::new());
        assert!(v.validate(&RequestSurfaces::new(Method::GET, "/")).unwrap().is_none());
    }

    #[test]
    fn test_required_without_params_is_precondition() {
        let v = PathValidator::required(None, HandlerSignature::new());
        let err = v.validate(&RequestSurfaces::new(Method::GET, "/")).unwrap_err();
        assert_eq!(err, ValidationError::MissingPathParams);
        assert!(err.is_precondition());
    }

    #[test]
    fn test_all_field_failures_collected() {
        let sig = HandlerSignature::new()
            .param("b", FieldType::Integer)
            .param("c", FieldType::Number);
        let req = RequestSurfaces::new(Method::GET, "/")
            .with_path_param("b", "x")
            .with_path_param("c", "y");
        let err = PathValidator::new(None, sig).validate(&req).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["b", "c"]);
    }

    #[test]
    fn test_signature_format_follows_flag() {
        let sig = HandlerSignature::new().param("id", FieldType::Uuid);
        let req = item_request("nope");

        let err = PathValidator::new(None, sig.clone()).validate(&req).unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::Format);

        let rec = PathValidator::new(None, sig)
            .validate_formats(false)
            .validate(&req)
            .unwrap()
            .unwrap();
        assert_eq!(rec.get("id"), Some(&json!("nope")));
    }
}
