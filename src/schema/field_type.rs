use crate::error::{FieldViolation, ViolationKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use super::Schema;

/// Type of a single handler parameter
///
/// Used to validate one value on its own, without a surrounding model.
/// Every variant renders to a JSON Schema fragment, so a lone value goes
/// through the same coercion and assertion as a full [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Accepts anything, unchanged
    Any,
    String,
    Integer,
    Number,
    Boolean,
    /// A string in canonical UUID form
    Uuid,
    /// A list whose items all have the inner type
    Array(Box<FieldType>),
    /// The inner type or null
    Optional(Box<FieldType>),
}

impl FieldType {
    /// JSON Schema fragment asserting this type
    #[must_use]
    pub fn to_schema(&self) -> Value {
        match self {
            FieldType::Any => json!({}),
            FieldType::String => json!({"type": "string"}),
            FieldType::Integer => json!({"type": "integer"}),
            FieldType::Number => json!({"type": "number"}),
            FieldType::Boolean => json!({"type": "boolean"}),
            FieldType::Uuid => json!({"type": "string", "format": "uuid"}),
            FieldType::Array(inner) => json!({"type": "array", "items": inner.to_schema()}),
            FieldType::Optional(inner) => {
                let mut schema = inner.to_schema();
                if let Some(obj) = schema.as_object_mut() {
                    if let Some(Value::String(ty)) = obj.get("type").cloned() {
                        obj.insert("type".to_string(), json!([ty, "null"]));
                    }
                }
                schema
            }
        }
    }

    /// Type of a value as the router bound it
    ///
    /// Strings stay strings, router-converted numbers keep their integer or
    /// float nature. Used when a path parameter has no declared type.
    #[must_use]
    pub fn natural(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
            Value::Number(_) => FieldType::Number,
            Value::Array(items) => FieldType::Array(Box::new(
                items.first().map(FieldType::natural).unwrap_or(FieldType::Any),
            )),
            Value::Object(_) | Value::Null => FieldType::Any,
        }
    }

    /// Validate a single named value against this type
    ///
    /// # Errors
    ///
    /// Returns violations whose field paths are rooted at `field`.
    pub fn validate(&self, field: &str, value: &Value) -> Result<Value, Vec<FieldViolation>> {
        self.validate_with_formats(field, value, true)
    }

    /// [`FieldType::validate`], choosing whether `format` (uuid, date-time,
    /// ...) is asserted
    ///
    /// # Errors
    ///
    /// Returns violations whose field paths are rooted at `field`.
    pub fn validate_with_formats(
        &self,
        field: &str,
        value: &Value,
        validate_formats: bool,
    ) -> Result<Value, Vec<FieldViolation>> {
        let schema = Schema::with_formats(self.to_string(), self.to_schema(), validate_formats)
            .map_err(|e| {
                vec![FieldViolation::new(
                    field,
                    ViolationKind::Constraint,
                    e.to_string(),
                )]
            })?;
        schema
            .validate(value)
            .map_err(|errs| errs.into_iter().map(|v| v.nested_under(field)).collect())
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any => write!(f, "any"),
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::Array(inner) => write!(f, "list[{inner}]"),
            FieldType::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

/// Error returned when a type name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldTypeError(pub String);

impl Display for ParseFieldTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field type '{}'", self.0)
    }
}

impl std::error::Error for ParseFieldTypeError {}

fn strip_wrapper<'a>(s: &'a str, prefixes: &[&str], close: char) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|p| s.strip_prefix(p))
        .and_then(|rest| rest.strip_suffix(close))
}

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    /// Accepts `str`, `int`, `float`, `bool`, `uuid`, `any` and their long
    /// forms, `list[T]` / `array<T>` / `[T]`, and `T?` / `optional[T]` /
    /// `T | None` for nullable types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return Ok(FieldType::Optional(Box::new(inner.parse()?)));
        }
        if let Some(inner) = s
            .strip_suffix("| None")
            .or_else(|| s.strip_suffix("|None"))
        {
            return Ok(FieldType::Optional(Box::new(inner.trim().parse()?)));
        }
        if let Some(inner) = strip_wrapper(s, &["optional[", "Optional["], ']') {
            return Ok(FieldType::Optional(Box::new(inner.parse()?)));
        }
        if let Some(inner) = strip_wrapper(s, &["list[", "List["], ']')
            .or_else(|| strip_wrapper(s, &["array<", "Vec<"], '>'))
            .or_else(|| strip_wrapper(s, &["["], ']'))
        {
            return Ok(FieldType::Array(Box::new(inner.parse()?)));
        }
        match s.to_ascii_lowercase().as_str() {
            "any" | "" => Ok(FieldType::Any),
            "str" | "string" => Ok(FieldType::String),
            "int" | "integer" | "i64" | "i32" | "u64" | "u32" => Ok(FieldType::Integer),
            "float" | "number" | "f64" | "f32" => Ok(FieldType::Number),
            "bool" | "boolean" => Ok(FieldType::Boolean),
            "uuid" | "uuid.uuid" => Ok(FieldType::Uuid),
            "list" | "array" => Ok(FieldType::Array(Box::new(FieldType::Any))),
            _ => Err(ParseFieldTypeError(s.to_string())),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<FieldType>().map_err(serde::de::Error::custom)
    }
}
