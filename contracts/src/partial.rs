use crate::api::ValidationError;
use crate::errors::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Merge patch: objects merge key by key, `null` leaves the target untouched
/// and any other value replaces it.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None if !value.is_null() => {
                        target.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Collects the paths of non-null patch keys that `typed` lacks.
fn unknown_fields(typed: &Value, patch: &Value, path: &str, out: &mut Vec<String>) {
    let (Value::Object(typed), Value::Object(patch)) = (typed, patch) else {
        return;
    };
    for (key, value) in patch.iter().filter(|(_, v)| !v.is_null()) {
        let field = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        match typed.get(key) {
            Some(existing) => unknown_fields(existing, value, &field, out),
            None => out.push(field),
        }
    }
}

/// Applies `patch` to a copy of `base`. Fails when the merged document no
/// longer has the shape of `T` or the patch names a field `T` does not have.
pub fn apply_deep_partial<T>(base: &T, patch: &Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = serde_json::to_value(base)?;
    deep_merge(&mut doc, patch);
    let patched: T = serde_json::from_value(doc)?;

    // Fields serde ignored on the way in are missing on the way out
    let mut unknown = Vec::new();
    unknown_fields(&serde_json::to_value(&patched)?, patch, "", &mut unknown);
    if !unknown.is_empty() {
        return Err(Error::Validation(
            unknown
                .into_iter()
                .map(|field| {
                    let message = format!("{} is not a known field", field);
                    ValidationError::new(field, message)
                })
                .collect(),
        ));
    }
    Ok(patched)
}
