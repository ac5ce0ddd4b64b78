//! Layered configuration merge.
//!
//! Layers are merged highest precedence first. A value already present in
//! the accumulator wins over the same key in a lower layer; arrays are
//! concatenated (higher layer's items first) and objects merge key-wise.
//! `None` and JSON `null` never shadow a lower layer's value.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Fill in `self` from a lower-precedence layer.
pub trait Defaults: Sized {
    fn with_defaults(self, lower: Self) -> Self;
}

impl<T> Defaults for Option<T> {
    fn with_defaults(self, lower: Self) -> Self {
        self.or(lower)
    }
}

impl<T> Defaults for Vec<T> {
    fn with_defaults(mut self, lower: Self) -> Self {
        self.extend(lower);
        self
    }
}

impl<V> Defaults for IndexMap<String, V> {
    fn with_defaults(mut self, lower: Self) -> Self {
        for (key, value) in lower {
            self.entry(key).or_insert(value);
        }
        self
    }
}

impl Defaults for Map<String, Value> {
    fn with_defaults(self, lower: Self) -> Self {
        match merge_json_defaults(Value::Object(self), Value::Object(lower)) {
            Value::Object(map) => map,
            _ => unreachable!("merging two objects yields an object"),
        }
    }
}

impl Defaults for Value {
    fn with_defaults(self, lower: Self) -> Self {
        merge_json_defaults(self, lower)
    }
}

/// Deep-merge two JSON values, `higher` taking precedence.
pub fn merge_json_defaults(higher: Value, lower: Value) -> Value {
    match (higher, lower) {
        (Value::Null, lower) => lower,
        (Value::Array(mut higher), Value::Array(lower)) => {
            higher.extend(lower);
            Value::Array(higher)
        }
        (Value::Object(higher), Value::Object(mut lower)) => {
            for (key, value) in higher {
                match lower.get_mut(&key) {
                    Some(slot) => {
                        let existing = slot.take();
                        *slot = merge_json_defaults(value, existing);
                    }
                    None => {
                        lower.insert(key, value);
                    }
                }
            }
            Value::Object(lower)
        }
        (higher, _) => higher,
    }
}

/// Merge layers given highest precedence first.
pub fn merge_layers<T, I>(layers: I) -> T
where
    T: Defaults + Default,
    I: IntoIterator<Item = T>,
{
    let mut layers = layers.into_iter();
    let first = layers.next().unwrap_or_default();
    layers.fold(first, Defaults::with_defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn higher_scalar_wins() {
        let merged = merge_json_defaults(json!({ "a": 1 }), json!({ "a": 2, "b": 3 }));
        assert_eq!(merged, json!({ "a": 1, "b": 3 }));
    }

    #[test]
    fn null_does_not_shadow_lower_value() {
        let merged = merge_json_defaults(json!({ "a": null }), json!({ "a": "kept" }));
        assert_eq!(merged, json!({ "a": "kept" }));
    }

    #[test]
    fn arrays_concatenate_in_precedence_order() {
        let merged = merge_json_defaults(json!({ "x": [1, 2] }), json!({ "x": [2, 3] }));
        assert_eq!(merged, json!({ "x": [1, 2, 2, 3] }));
    }

    #[test]
    fn nested_objects_merge_key_wise() {
        let merged = merge_json_defaults(
            json!({ "esbuild": { "minify": true } }),
            json!({ "esbuild": { "target": "es2020", "minify": false } }),
        );
        assert_eq!(merged, json!({ "esbuild": { "target": "es2020", "minify": true } }));
    }

    #[test]
    fn merge_layers_folds_highest_first() {
        let merged: Option<u32> = merge_layers([None, Some(2), Some(3)]);
        assert_eq!(merged, Some(2));

        let merged: Vec<&str> = merge_layers([vec!["a"], vec![], vec!["b", "c"]]);
        assert_eq!(merged, vec!["a", "b", "c"]);
    }
}
