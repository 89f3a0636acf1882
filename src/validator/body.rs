use super::{as_record, Surface, SurfaceValidator};
use crate::error::ValidationError;
use crate::request::{BodyPayload, RequestSurfaces};
use crate::runtime_config::UnexpectedBodyPolicy;
use crate::schema::Schema;
use crate::validated::Record;
use serde_json::Value;
use tracing::{debug, warn};

/// Validates a JSON request body against an explicit schema
///
/// Body and form are mutually exclusive: a request whose payload was
/// consumed as form fields has no body as far as this validator is
/// concerned. Without a schema, a non-empty body is a contract mismatch and
/// is rejected with [`ValidationError::UnexpectedData`] (unless the policy
/// says to ignore it).
#[derive(Debug, Clone)]
pub struct BodyValidator {
    schema: Option<Schema>,
    policy: UnexpectedBodyPolicy,
}

impl BodyValidator {
    #[must_use]
    pub fn new(schema: Option<Schema>) -> Self {
        BodyValidator {
            schema,
            policy: UnexpectedBodyPolicy::Reject,
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: UnexpectedBodyPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn unexpected(
        &self,
        surface: Surface,
        req: &RequestSurfaces,
    ) -> Result<Option<Record>, ValidationError> {
        match self.policy {
            UnexpectedBodyPolicy::Reject => {
                warn!(
                    surface = %surface,
                    path = %req.path,
                    category = "configuration",
                    "Request carried data on a surface with no declared schema"
                );
                Err(ValidationError::UnexpectedData { surface })
            }
            UnexpectedBodyPolicy::Ignore => {
                debug!(surface = %surface, "Ignoring undeclared request data");
                Ok(None)
            }
        }
    }
}

/// Empty payloads (`{}`, `[]`, `null`, `""`) do not count as data
fn carries_data(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

impl SurfaceValidator for BodyValidator {
    fn surface(&self) -> Surface {
        Surface::Body
    }

    fn validate(&self, req: &RequestSurfaces) -> Result<Option<Record>, ValidationError> {
        if !req.form.is_empty() || req.is_form() {
            // Payload was consumed as form data; only undeclared forms matter here.
            if self.schema.is_none() && !req.form.is_empty() {
                return self.unexpected(Surface::Form, req);
            }
            return Ok(None);
        }
        if !req.has_body() {
            return Ok(None);
        }

        let payload = match &req.body {
            BodyPayload::Absent => return Ok(None),
            BodyPayload::Malformed { reason } => {
                return Err(ValidationError::MalformedBody {
                    reason: reason.clone(),
                })
            }
            BodyPayload::Unsupported { content_type } => {
                return Err(ValidationError::UnsupportedMediaType {
                    content_type: Some(content_type.clone()),
                })
            }
            BodyPayload::Json(value) => value,
        };

        match &self.schema {
            Some(schema) => {
                debug!(schema = schema.name(), "Validating request body");
                as_record(Surface::Body, schema, payload).map(Some)
            }
            None if carries_data(payload) => self.unexpected(Surface::Body, req),
            None => Ok(None),
        }
    }
}
