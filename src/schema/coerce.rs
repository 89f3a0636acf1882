//! Lax coercion of submitted values toward a JSON Schema.
//!
//! Path segments, query strings and form fields only ever carry text. Before
//! a schema is asserted, values are converted toward the declared `type` so
//! that `"42"` satisfies an `integer` property. A conversion that fails
//! leaves the value untouched; the schema then reports the type violation.
//!
//! Wrapping a lone scalar into a one-element array only makes sense for text
//! surfaces, where a repeated key with a single occurrence is
//! indistinguishable from a scalar. JSON bodies carry real arrays, so
//! [`coerce_strict`] leaves a non-array value for the schema to reject.

use serde_json::{Map, Number, Value};

/// Return a coerced copy of `value` shaped by `schema`.
///
/// - `integer`: numeric strings and integral floats become integers
/// - `number`: numeric strings become numbers
/// - `boolean`: `true/false`, `1/0`, `yes/no`, `on/off` (any case)
/// - `array`: a lone string, number or boolean is wrapped into a
///   one-element array, items are coerced with `items`
/// - `object`: declared `properties` are coerced, missing ones with a
///   `default` are filled in, extras are coerced with an object-valued
///   `additionalProperties`
///
/// A value that already matches one of the declared types is left alone,
/// so `["string", "integer"]` keeps `"5"` as a string.
pub fn coerce(value: &Value, schema: &Value) -> Value {
    coerce_with(value, schema, true)
}

/// Like [`coerce`], but a non-array value is never wrapped to satisfy an
/// `array` schema. Used for JSON bodies.
pub fn coerce_strict(value: &Value, schema: &Value) -> Value {
    coerce_with(value, schema, false)
}

pub(crate) fn coerce_with(value: &Value, schema: &Value, lax_arrays: bool) -> Value {
    let types = declared_types(schema);

    if value.is_null() {
        return Value::Null;
    }

    if let Value::Object(obj) = value {
        if types.is_empty() || types.contains(&"object") {
            return coerce_object(obj, schema, lax_arrays);
        }
    }

    if let Value::Array(items) = value {
        if types.is_empty() || types.contains(&"array") {
            return Value::Array(coerce_items(items, schema, lax_arrays));
        }
    }

    if types.is_empty() || types.iter().any(|ty| matches_type(value, ty)) {
        return value.clone();
    }

    for ty in types.iter().filter(|ty| **ty != "null") {
        if let Some(converted) = convert_to(value, ty, schema, lax_arrays) {
            return converted;
        }
    }
    value.clone()
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
        _ => {
            if schema.get("properties").is_some() {
                vec!["object"]
            } else if schema.get("items").is_some() {
                vec!["array"]
            } else {
                Vec::new()
            }
        }
    }
}

fn matches_type(value: &Value, ty: &str) -> bool {
    match ty {
        "string" => value.is_string(),
        "integer" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            _ => false,
        },
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn convert_to(value: &Value, ty: &str, schema: &Value, lax_arrays: bool) -> Option<Value> {
    match (ty, value) {
        ("integer", Value::String(s)) => parse_integer(s.trim()),
        ("integer", Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        ("number", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ("boolean", Value::String(s)) => parse_bool(s.trim()).map(Value::Bool),
        ("array", scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_)))
            if lax_arrays =>
        {
            Some(Value::Array(coerce_items(
                std::slice::from_ref(scalar),
                schema,
                lax_arrays,
            )))
        }
        _ => None,
    }
}

fn parse_integer(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| Value::from(f as i64))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "n" | "f" => Some(false),
        _ => None,
    }
}

fn coerce_items(items: &[Value], schema: &Value, lax_arrays: bool) -> Vec<Value> {
    match schema.get("items") {
        Some(item_schema) if item_schema.is_object() => items
            .iter()
            .map(|v| coerce_with(v, item_schema, lax_arrays))
            .collect(),
        _ => items.to_vec(),
    }
}

fn coerce_object(obj: &Map<String, Value>, schema: &Value, lax_arrays: bool) -> Value {
    let properties = schema.get("properties").and_then(Value::as_object);
    let extra_schema = schema
        .get("additionalProperties")
        .filter(|s| s.is_object());

    let mut out = Map::with_capacity(obj.len());
    for (key, val) in obj {
        let coerced = match properties.and_then(|p| p.get(key)) {
            Some(prop_schema) => coerce_with(val, prop_schema, lax_arrays),
            None => match extra_schema {
                Some(s) => coerce_with(val, s, lax_arrays),
                None => val.clone(),
            },
        };
        out.insert(key.clone(), coerced);
    }

    if let Some(props) = properties {
        for (key, prop_schema) in props {
            if out.contains_key(key) {
                continue;
            }
            if let Some(default) = prop_schema.get("default") {
                out.insert(key.clone(), default.clone());
            }
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_coercion() {
        assert_eq!(coerce(&json!("42"), &json!({"type": "integer"})), json!(42));
        assert_eq!(coerce(&json!("4.0"), &json!({"type": "integer"})), json!(4));
        assert_eq!(coerce(&json!(7.0), &json!({"type": "integer"})), json!(7));
        assert_eq!(coerce(&json!("2.5"), &json!({"type": "number"})), json!(2.5));
        assert_eq!(coerce(&json!("on"), &json!({"type": "boolean"})), json!(true));
        assert_eq!(coerce(&json!("No"), &json!({"type": "boolean"})), json!(false));
    }

    #[test]
    fn test_failed_coercion_keeps_value() {
        assert_eq!(coerce(&json!("abc"), &json!({"type": "integer"})), json!("abc"));
        assert_eq!(coerce(&json!("maybe"), &json!({"type": "boolean"})), json!("maybe"));
        assert_eq!(coerce(&json!(5), &json!({"type": "string"})), json!(5));
    }

    #[test]
    fn test_matching_union_member_wins() {
        let schema = json!({"type": ["string", "integer"]});
        assert_eq!(coerce(&json!("5"), &schema), json!("5"));
        let nullable = json!({"type": ["integer", "null"]});
        assert_eq!(coerce(&json!("5"), &nullable), json!(5));
        assert_eq!(coerce(&Value::Null, &nullable), Value::Null);
    }

    #[test]
    fn test_array_wraps_scalar_and_coerces_items() {
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        assert_eq!(coerce(&json!("3"), &schema), json!([3]));
        assert_eq!(coerce(&json!(["1", "2"]), &schema), json!([1, 2]));
    }

    #[test]
    fn test_objects_are_never_wrapped_into_arrays() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let obj = json!({"name": "x"});
        assert_eq!(coerce(&obj, &schema), obj);
        assert_eq!(coerce_strict(&obj, &schema), obj);
    }

    #[test]
    fn test_strict_leaves_scalars_for_array_fields() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string"}},
                "age": {"type": "integer"}
            }
        });
        let out = coerce_strict(&json!({"tags": "good", "age": "3"}), &schema);
        assert_eq!(out, json!({"tags": "good", "age": 3}));
        let out = coerce(&json!({"tags": "good"}), &schema);
        assert_eq!(out, json!({"tags": ["good"]}));
    }

    #[test]
    fn test_object_properties_and_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "b": {"type": "integer"},
                "c": {"type": "number", "default": 1.5},
                "x": {"type": "string"}
            }
        });
        let input = json!({"b": "5", "x": "hi", "extra": "1"});
        let out = coerce(&input, &schema);
        assert_eq!(out, json!({"b": 5, "x": "hi", "extra": "1", "c": 1.5}));
        // input untouched
        assert_eq!(input["b"], json!("5"));
    }

    #[test]
    fn test_additional_properties_schema_applies_to_extras() {
        let schema = json!({
            "type": "object",
            "additionalProperties": {"type": "integer"}
        });
        assert_eq!(coerce(&json!({"a": "1"}), &schema), json!({"a": 1}));
    }
}
