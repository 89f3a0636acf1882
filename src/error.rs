use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validator::Surface;

/// Field name used when a violation concerns the payload as a whole.
pub const ROOT_FIELD: &str = "__root__";

/// Classification of a single field violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field was not supplied
    Missing,
    /// A field was supplied that a closed schema does not allow
    Unexpected,
    /// The value has the wrong type and could not be coerced
    Type,
    /// The value does not match a declared `format` (uuid, email, ...)
    Format,
    /// The value is not one of the allowed options
    Enum,
    /// Any other schema constraint (range, length, pattern, ...)
    Constraint,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Missing => "missing",
            ViolationKind::Unexpected => "unexpected",
            ViolationKind::Type => "type",
            ViolationKind::Format => "format",
            ViolationKind::Enum => "enum",
            ViolationKind::Constraint => "constraint",
        };
        write!(f, "{s}")
    }
}

/// One per-field violation record
///
/// `field` is a dotted path into the validated payload (`tags.0.name`),
/// or [`ROOT_FIELD`] when the whole payload is at fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        FieldViolation {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    /// Prefix the field path with a parent name, used when a value was
    /// validated on its own and is reported as a member of a record.
    #[must_use]
    pub fn nested_under(mut self, parent: &str) -> Self {
        self.field = if self.field == ROOT_FIELD {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.field)
        };
        self
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)
    }
}

/// Failure raised while validating a request
///
/// Every variant stops the pipeline at the point of detection; no partial
/// [`ValidatedRequest`](crate::ValidatedRequest) reaches the handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Submitted data does not satisfy the resolved schema or type
    Fields {
        /// Surface the data came from
        surface: Surface,
        /// All violations found in that surface
        violations: Vec<FieldViolation>,
    },
    /// Data arrived on a surface for which no schema was declared
    UnexpectedData {
        /// Surface that carried the undeclared data
        surface: Surface,
    },
    /// Path validation was required on a route that binds no path parameters
    ///
    /// This is a route setup bug, not bad client input.
    MissingPathParams,
    /// Form validation was required but the request is not form encoded
    UnsupportedMediaType {
        /// The content type the request actually declared, if any
        content_type: Option<String>,
    },
    /// The request body could not be parsed as JSON
    MalformedBody {
        /// Parser error message
        reason: String,
    },
}

impl ValidationError {
    /// Build a field failure for a surface
    pub fn fields(surface: Surface, violations: Vec<FieldViolation>) -> Self {
        ValidationError::Fields {
            surface,
            violations,
        }
    }

    /// HTTP status the default error handler renders for this failure
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ValidationError::Fields { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ValidationError::UnexpectedData { .. } => StatusCode::BAD_REQUEST,
            ValidationError::MissingPathParams => StatusCode::INTERNAL_SERVER_ERROR,
            ValidationError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ValidationError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable category label for logs and counters
    ///
    /// `configuration` separates contract mistakes made by the route author
    /// from ordinary `field` failures caused by client input.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            ValidationError::Fields { .. } => "field",
            ValidationError::UnexpectedData { .. } | ValidationError::MissingPathParams => {
                "configuration"
            }
            ValidationError::UnsupportedMediaType { .. } => "media_type",
            ValidationError::MalformedBody { .. } => "parse",
        }
    }

    /// The surface the failure belongs to, when there is one
    #[must_use]
    pub fn surface(&self) -> Option<Surface> {
        match self {
            ValidationError::Fields { surface, .. }
            | ValidationError::UnexpectedData { surface } => Some(*surface),
            ValidationError::MissingPathParams => Some(Surface::Path),
            ValidationError::UnsupportedMediaType { .. } => Some(Surface::Form),
            ValidationError::MalformedBody { .. } => Some(Surface::Body),
        }
    }

    /// Per-field violations; empty for non-field failures
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ValidationError::Fields { violations, .. } => violations,
            _ => &[],
        }
    }

    /// `true` for failures that indicate a route setup bug
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, ValidationError::MissingPathParams)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Fields {
                surface,
                violations,
            } => {
                write!(
                    f,
                    "{surface} validation failed with {} violation(s)",
                    violations.len()
                )?;
                for v in violations {
                    write!(f, "; {v}")?;
                }
                Ok(())
            }
            ValidationError::UnexpectedData { surface } => {
                write!(
                    f,
                    "Unexpected data was provided: the {surface} surface has no declared schema"
                )
            }
            ValidationError::MissingPathParams => {
                write!(f, "Expected path parameters but none were found")
            }
            ValidationError::UnsupportedMediaType { content_type } => match content_type {
                Some(ct) => write!(
                    f,
                    "Unsupported media type '{ct}': expected application/x-www-form-urlencoded or multipart/form-data"
                ),
                None => write!(
                    f,
                    "Missing content type: expected application/x-www-form-urlencoded or multipart/form-data"
                ),
            },
            ValidationError::MalformedBody { reason } => {
                write!(f, "Request body is not valid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error raised when a schema document cannot be compiled
///
/// Schemas are compiled when a route is registered, so this surfaces at
/// startup rather than while serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Name of the schema that failed to compile
    pub schema: String,
    /// Compiler message
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema '{}': {}", self.schema, self.message)
    }
}

impl std::error::Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_category() {
        let e = ValidationError::fields(Surface::Body, vec![]);
        assert_eq!(e.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(e.category(), "field");

        let e = ValidationError::UnexpectedData {
            surface: Surface::Body,
        };
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.category(), "configuration");

        assert_eq!(ValidationError::MissingPathParams.category(), "configuration");
        assert!(ValidationError::MissingPathParams.is_precondition());

        let e = ValidationError::UnsupportedMediaType {
            content_type: Some("application/json".into()),
        };
        assert_eq!(e.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let e = ValidationError::MalformedBody {
            reason: "eof".into(),
        };
        assert_eq!(e.category(), "parse");
        assert_ne!(e.category(), ValidationError::fields(Surface::Body, vec![]).category());
    }

    #[test]
    fn test_nested_under() {
        let v = FieldViolation::new(ROOT_FIELD, ViolationKind::Type, "bad");
        assert_eq!(v.nested_under("id").field, "id");
        let v = FieldViolation::new("0", ViolationKind::Type, "bad");
        assert_eq!(v.nested_under("ids").field, "ids.0");
    }

    #[test]
    fn test_display_lists_violations() {
        let e = ValidationError::fields(
            Surface::Path,
            vec![FieldViolation::new("id", ViolationKind::Type, "not an integer")],
        );
        let s = e.to_string();
        assert!(s.contains("path validation failed"));
        assert!(s.contains("id [type]: not an integer"));
    }
}
