use serde_json::{Map, Value};

use crate::error::ApiError;

/// Map both response shapes the backend uses onto the bare entity.
///
/// Accepted shapes:
/// - the entity itself (`{ "id": 1, ... }`)
/// - `{ "success": true, "<key>": { ... } }` for the first matching key in
///   `entity_keys`, then `data`
/// - `{ "success": true, "id": 1, ... }` with the entity fields inlined
///
/// `{ "success": false, "message": ... }` becomes `ApiError::Rejected`.
///
/// # Errors
///
/// Returns `ApiError::Rejected` when the envelope reports failure.
pub fn unwrap_envelope(body: Value, entity_keys: &[&str]) -> Result<Value, ApiError> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };
    let Some(success) = map.remove("success") else {
        return Ok(Value::Object(map));
    };

    if success == Value::Bool(false) {
        return Err(ApiError::Rejected {
            message: failure_message(&map),
        });
    }

    for key in entity_keys.iter().copied().chain(std::iter::once("data")) {
        if let Some(inner) = map.remove(key) {
            if !inner.is_null() {
                return Ok(inner);
            }
        }
    }

    map.remove("message");
    Ok(Value::Object(map))
}

fn failure_message(map: &Map<String, Value>) -> String {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or("request was not accepted")
        .to_string()
}
