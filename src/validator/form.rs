use super::{as_record, Surface, SurfaceValidator};
use crate::error::ValidationError;
use crate::multi_value;
use crate::request::RequestSurfaces;
use crate::schema::Schema;
use crate::validated::Record;
use serde_json::Value;
use tracing::{debug, warn};

/// Validates form fields against a required schema
///
/// The request must be form encoded; that is checked as a precondition by
/// the pipeline so a JSON request never reaches field validation.
#[derive(Debug, Clone)]
pub struct FormValidator {
    schema: Schema,
}

impl FormValidator {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        FormValidator { schema }
    }
}

impl SurfaceValidator for FormValidator {
    fn surface(&self) -> Surface {
        Surface::Form
    }

    fn precondition(&self, req: &RequestSurfaces) -> Result<(), ValidationError> {
        if req.is_form() {
            return Ok(());
        }
        let content_type = req.content_type();
        warn!(
            content_type = content_type.as_deref().unwrap_or("<none>"),
            path = %req.path,
            "Form validation requested on a request that is not form encoded"
        );
        Err(ValidationError::UnsupportedMediaType { content_type })
    }

    fn validate(&self, req: &RequestSurfaces) -> Result<Option<Record>, ValidationError> {
        let flat = multi_value::extract(req.form.iter().cloned());
        debug!(
            schema = self.schema.name(),
            field_count = flat.len(),
            "Validating form fields"
        );
        as_record(Surface::Form, &self.schema, &Value::Object(flat)).map(Some)
    }
}
