//! Multi-value collapse for query strings and form bodies.
//!
//! A key submitted once maps to its scalar value; a key submitted two or
//! more times maps to the ordered list of all its values. Schema authors can
//! then declare `limit: integer` without wrapping it in a list, and still
//! receive `tag=a&tag=b` as `["a", "b"]`.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Group ordered `(key, value)` pairs into `(key, [values])`, keeping keys
/// in first-occurrence order and values in submission order.
pub fn group_pairs<K, V, I>(pairs: I) -> Vec<(String, Vec<String>)>
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (key, value) in pairs {
        let key = key.into();
        match index.get(&key) {
            Some(&slot) => grouped[slot].1.push(value.into()),
            None => {
                index.insert(key.clone(), grouped.len());
                grouped.push((key, vec![value.into()]));
            }
        }
    }
    grouped
}

/// Collapse `(key, [values])` lists into a flat mapping
///
/// A key with exactly one value maps to a string; a key with two or more
/// maps to an array of strings. A key with no values is dropped.
pub fn collapse(lists: Vec<(String, Vec<String>)>) -> Map<String, Value> {
    let mut flat = Map::with_capacity(lists.len());
    for (key, mut values) in lists {
        let value = match values.len() {
            0 => continue,
            1 => Value::String(values.swap_remove(0)),
            _ => Value::Array(values.into_iter().map(Value::String).collect()),
        };
        flat.insert(key, value);
    }
    flat
}

/// Group then collapse raw pairs in one step
pub fn extract<K, V, I>(pairs: I) -> Map<String, Value>
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    collapse(group_pairs(pairs))
}
