//! # Schema Module
//!
//! Declarative models for request surfaces, backed by JSON Schema.
//!
//! A [`Schema`] is compiled once, when the route that uses it is declared,
//! and is immutable afterwards so it can be shared by every request served
//! on that route. Validation is *lax*: text values are first coerced toward
//! the declared types (see [`coerce`]) and the coerced copy is then asserted
//! against the schema. The raw input is never modified.
//!
//! Openness is whatever the document says: `additionalProperties: false`
//! rejects unknown fields, anything else lets them through.
//!
//! ```rust
//! use reqcheck::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::new("Item", json!({
//!     "type": "object",
//!     "properties": {"id": {"type": "integer"}},
//!     "required": ["id"]
//! })).unwrap();
//!
//! let value = schema.validate(&json!({"id": "42"})).unwrap();
//! assert_eq!(value, json!({"id": 42}));
//! ```

pub mod coerce;
mod field_type;

pub use coerce::{coerce, coerce_strict};
pub use field_type::{FieldType, ParseFieldTypeError};

use crate::error::{FieldViolation, SchemaError, ViolationKind, ROOT_FIELD};
use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A named, compiled JSON Schema
#[derive(Clone)]
pub struct Schema {
    name: Arc<str>,
    document: Arc<Value>,
    validator: Arc<Validator>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("document", &self.document)
            .finish()
    }
}

impl Schema {
    /// Compile a schema that asserts `format` keywords (`uuid`, `email`, ...)
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the document is not a valid JSON Schema.
    pub fn new(name: impl Into<String>, document: Value) -> Result<Self, SchemaError> {
        Self::with_formats(name, document, true)
    }

    /// Compile a schema, choosing whether `format` is asserted or only annotated
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the document is not a valid JSON Schema.
    pub fn with_formats(
        name: impl Into<String>,
        document: Value,
        validate_formats: bool,
    ) -> Result<Self, SchemaError> {
        let name: String = name.into();
        let validator = jsonschema::options()
            .should_validate_formats(validate_formats)
            .build(&document)
            .map_err(|e| SchemaError {
                schema: name.clone(),
                message: e.to_string(),
            })?;
        Ok(Schema {
            name: Arc::from(name),
            document: Arc::new(document),
            validator: Arc::new(validator),
        })
    }

    /// Schema name, reported on validated records
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source JSON Schema document
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Coerce `data` toward the schema and assert it
    ///
    /// Returns the coerced value on success, or every violation found.
    ///
    /// # Errors
    ///
    /// Returns the list of [`FieldViolation`]s when the coerced value does
    /// not satisfy the schema.
    pub fn validate(&self, data: &Value) -> Result<Value, Vec<FieldViolation>> {
        self.assert(coerce(data, &self.document))
    }

    /// Like [`Schema::validate`] for JSON payloads: a value is never wrapped
    /// into an array to satisfy an `array` schema.
    ///
    /// # Errors
    ///
    /// Returns the list of [`FieldViolation`]s when the coerced value does
    /// not satisfy the schema.
    pub fn validate_json(&self, data: &Value) -> Result<Value, Vec<FieldViolation>> {
        self.assert(coerce_strict(data, &self.document))
    }

    fn assert(&self, coerced: Value) -> Result<Value, Vec<FieldViolation>> {
        let violations: Vec<FieldViolation> = self
            .validator
            .iter_errors(&coerced)
            .flat_map(|e| violations_from(&e))
            .collect();
        if violations.is_empty() {
            Ok(coerced)
        } else {
            Err(violations)
        }
    }

    /// `true` when `data` satisfies the schema without coercion
    #[must_use]
    pub fn is_valid(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }
}

/// Convert a JSON pointer (`/tags/0/name`) into a dotted field path.
pub(crate) fn pointer_to_field(pointer: &str) -> String {
    if pointer.is_empty() || pointer == "/" {
        return ROOT_FIELD.to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn join_field(parent: &str, child: &str) -> String {
    if parent == ROOT_FIELD {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

fn violations_from(error: &jsonschema::ValidationError<'_>) -> Vec<FieldViolation> {
    let location = pointer_to_field(error.instance_path.as_str());
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            vec![FieldViolation::new(
                join_field(&location, &name),
                ViolationKind::Missing,
                "Field required",
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| {
                FieldViolation::new(
                    join_field(&location, name),
                    ViolationKind::Unexpected,
                    "Extra inputs are not permitted",
                )
            })
            .collect(),
        ValidationErrorKind::Type { .. } => vec![FieldViolation::new(
            location,
            ViolationKind::Type,
            error.to_string(),
        )],
        ValidationErrorKind::Format { .. } => vec![FieldViolation::new(
            location,
            ViolationKind::Format,
            error.to_string(),
        )],
        ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => {
            vec![FieldViolation::new(
                location,
                ViolationKind::Enum,
                error.to_string(),
            )]
        }
        _ => vec![FieldViolation::new(
            location,
            ViolationKind::Constraint,
            error.to_string(),
        )],
    }
}
