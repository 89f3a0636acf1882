//! # Surface Validators
//!
//! One validator per request surface, all behind [`SurfaceValidator`]:
//!
//! | Validator | Schema source | Absent schema |
//! |---|---|---|
//! | [`PathValidator`] | explicit, else per-field types from the [`HandlerSignature`](crate::HandlerSignature) | falls back to inferred typing |
//! | [`QueryValidator`] | explicit only | warning when data arrived, result empty |
//! | [`BodyValidator`] | explicit only | `UnexpectedData` when a body arrived |
//! | [`FormValidator`] | explicit, required | not constructible |
//!
//! Validators are pure with respect to their input: they read the
//! [`RequestSurfaces`] and return a new [`Record`] or a failure.

mod body;
mod form;
mod path;
mod query;

pub use body::BodyValidator;
pub use form::FormValidator;
pub use path::PathValidator;
pub use query::QueryValidator;

use crate::error::{FieldViolation, ValidationError, ViolationKind, ROOT_FIELD};
use crate::request::RequestSurfaces;
use crate::schema::Schema;
use crate::validated::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A request location validated independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Path,
    Query,
    Body,
    Form,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Surface::Path => "path",
            Surface::Query => "query",
            Surface::Body => "body",
            Surface::Form => "form",
        };
        write!(f, "{s}")
    }
}

/// Validation of one request surface
///
/// `precondition` is checked by the pipeline before `validate` runs; a
/// failing precondition means the validator never sees the data.
pub trait SurfaceValidator: Send + Sync {
    /// The surface this validator owns
    fn surface(&self) -> Surface;

    /// Request-level checks that must hold before the surface is read
    ///
    /// # Errors
    ///
    /// Returns the failure that stops the pipeline.
    fn precondition(&self, _req: &RequestSurfaces) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Validate the surface; `Ok(None)` means nothing was validated
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the data or the route setup is at fault.
    fn validate(&self, req: &RequestSurfaces) -> Result<Option<Record>, ValidationError>;
}

/// Validate `data` against a model and wrap the result into a [`Record`]
///
/// The validated value must be an object; anything else is reported on
/// the root field. Only text surfaces wrap a lone value into an array.
pub(crate) fn as_record(
    surface: Surface,
    schema: &Schema,
    data: &Value,
) -> Result<Record, ValidationError> {
    let validated = match surface {
        Surface::Body => schema.validate_json(data),
        Surface::Path | Surface::Query | Surface::Form => schema.validate(data),
    }
    .map_err(|violations| ValidationError::fields(surface, violations))?;
    match validated {
        Value::Object(fields) => Ok(Record::new(schema.name(), fields)),
        other => Err(ValidationError::fields(
            surface,
            vec![FieldViolation::new(
                ROOT_FIELD,
                ViolationKind::Type,
                format!("Input should be an object, got {}", json_kind(&other)),
            )],
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
