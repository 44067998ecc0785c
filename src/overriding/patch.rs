//! JSON deep-merge used to apply override entries.

use serde_json::Value;

/// Apply `patch` onto `target` in place.
///
/// - objects merge key by key, recursively
/// - a `null` in the patch deletes the key from the target
/// - arrays whose elements are all objects with a string `name` merge by name,
///   appending elements the target does not have yet
/// - anything else in the patch replaces the target value
pub fn patch_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value_for_key) in patch_map {
                if patch_value_for_key.is_null() {
                    target_map.remove(key);
                    continue;
                }
                match target_map.get_mut(key) {
                    Some(existing) => patch_value(existing, patch_value_for_key),
                    None => {
                        target_map.insert(key.clone(), strip_nulls(patch_value_for_key));
                    }
                }
            }
        }
        (Value::Array(target_items), Value::Array(patch_items))
            if is_named_list(target_items) && is_named_list(patch_items) =>
        {
            for item in patch_items {
                let name = item.get("name");
                match target_items.iter_mut().find(|t| t.get("name") == name) {
                    Some(existing) => patch_value(existing, item),
                    None => target_items.push(strip_nulls(item)),
                }
            }
        }
        (target, patch) => *target = strip_nulls(patch),
    }
}

fn is_named_list(items: &[Value]) -> bool {
    items.iter().all(|i| i.get("name").is_some_and(Value::is_string))
}

/// Copy of `value` with every `null` object entry removed.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}
