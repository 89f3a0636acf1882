//! Declared parameter types of a handler.
//!
//! Handlers register a [`HandlerSignature`] alongside their route: a table of
//! parameter name to [`FieldType`]. It is the only source of inferred typing
//! and is consulted solely as a per-field fallback for path parameters when
//! no explicit path schema was declared.

use crate::schema::{FieldType, ParseFieldTypeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameter name → declared type, fixed at route registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerSignature {
    params: BTreeMap<String, FieldType>,
}

impl HandlerSignature {
    /// An empty signature: every parameter falls back to its natural type
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the type of one parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.params.insert(name.into(), ty);
        self
    }

    /// Build a signature from textual type names (`"int"`, `"list[str]"`, ...)
    ///
    /// # Errors
    ///
    /// Fails on the first type name that cannot be parsed.
    pub fn parse<'a, I>(entries: I) -> Result<Self, ParseFieldTypeError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut sig = HandlerSignature::new();
        for (name, ty) in entries {
            sig.params.insert(name.to_string(), ty.parse()?);
        }
        Ok(sig)
    }

    /// Declared type for `name`, if any
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.params.get(name)
    }

    /// Target type for a bound value: the declared hint when present,
    /// otherwise the natural type of the value as bound by the router.
    #[must_use]
    pub fn target_type(&self, name: &str, value: &Value) -> FieldType {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| FieldType::natural(value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterate declared parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_type_prefers_declared_hint() {
        let sig = HandlerSignature::new().param("petId", FieldType::Integer);
        assert_eq!(sig.target_type("petId", &json!("7")), FieldType::Integer);
        assert_eq!(sig.target_type("other", &json!("7")), FieldType::String);
        assert_eq!(sig.target_type("other", &json!(7)), FieldType::Integer);
    }

    #[test]
    fn test_parse_from_names() {
        let sig = HandlerSignature::parse([("b", "int"), ("c", "float")]).unwrap();
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.get("c"), Some(&FieldType::Number));
        assert!(HandlerSignature::parse([("x", "complex")]).is_err());
    }

    #[test]
    fn test_deserialize_table() {
        let sig: HandlerSignature =
            serde_yaml::from_str("a: str\nb: int\nd: uuid\n").unwrap();
        assert_eq!(sig.get("d"), Some(&FieldType::Uuid));
        assert_eq!(sig.iter().count(), 3);
    }
}
