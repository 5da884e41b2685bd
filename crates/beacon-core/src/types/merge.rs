//! Recursive JSON object merge.

use serde_json::Value;

/// Merges `source` into `target`.
///
/// Objects are merged key by key, recursively. Any other value in `source`
/// replaces the value in `target`. A `null` source is a no-op.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = target.get_mut(key) {
                        deep_merge(existing, value);
                    }
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
