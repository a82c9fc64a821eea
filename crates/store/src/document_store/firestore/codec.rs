//! Conversion between plain JSON fields and Firestore's typed `Value` encoding.
//!
//! Firestore REST documents wrap every field in a one-key object naming its
//! type, e.g. `{"integerValue": "3"}` or `{"stringValue": "2025-01-01"}`.
//! Integers travel as decimal strings.

use serde_json::{json, Map, Number, Value as JsonValue};

use crate::document_store::r#trait::{Document, Fields, StoreError};

/// Encode a field map as a Firestore `fields` object.
pub fn encode_fields(fields: &Fields) -> JsonValue {
    let encoded: Map<String, JsonValue> = fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    JsonValue::Object(encoded)
}

pub fn encode_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(b) => json!({ "booleanValue": b }),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        JsonValue::String(s) => json!({ "stringValue": s }),
        JsonValue::Array(values) => {
            let values: Vec<JsonValue> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        JsonValue::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore `Document` resource into a keyed `Document`.
///
/// The key is the last segment of the resource `name`.
pub fn decode_document(resource: &JsonValue) -> Result<Document, StoreError> {
    let name = resource
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| StoreError::decode("<unknown>", "document resource has no name"))?;

    let key = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = match resource.get("fields") {
        None => Fields::new(),
        Some(JsonValue::Object(raw)) => decode_fields(&key, raw)?,
        Some(_) => return Err(StoreError::decode(key, "fields is not an object")),
    };

    Ok(Document::new(key, fields))
}

fn decode_fields(key: &str, raw: &Map<String, JsonValue>) -> Result<Fields, StoreError> {
    raw.iter()
        .map(|(name, value)| -> Result<(String, JsonValue), StoreError> {
            Ok((name.clone(), decode_value(key, value)?))
        })
        .collect()
}

fn decode_value(key: &str, value: &JsonValue) -> Result<JsonValue, StoreError> {
    let obj = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| StoreError::decode(key, format!("not a typed value: {value}")))?;

    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::decode(key, "empty typed value"))?;

    match kind.as_str() {
        "nullValue" => Ok(JsonValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(JsonValue::Bool)
            .ok_or_else(|| StoreError::decode(key, "booleanValue is not a bool")),
        "integerValue" => {
            let parsed = match inner {
                JsonValue::String(s) => s.parse::<i64>().ok(),
                JsonValue::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| JsonValue::Number(i.into()))
                .ok_or_else(|| StoreError::decode(key, format!("bad integerValue: {inner}")))
        }
        "doubleValue" => {
            let parsed = match inner {
                JsonValue::Number(n) => n.as_f64(),
                // NaN/Infinity are sent as strings.
                JsonValue::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            Ok(parsed
                .and_then(Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null))
        }
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| JsonValue::String(s.to_string()))
            .ok_or_else(|| StoreError::decode(key, format!("{kind} is not a string"))),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                None => Vec::new(),
                Some(JsonValue::Array(values)) => values
                    .iter()
                    .map(|v| decode_value(key, v))
                    .collect::<Result<_, _>>()?,
                Some(_) => return Err(StoreError::decode(key, "arrayValue.values is not an array")),
            };
            Ok(JsonValue::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            None => Ok(JsonValue::Object(Map::new())),
            Some(JsonValue::Object(raw)) => Ok(JsonValue::Object(decode_fields(key, raw)?)),
            Some(_) => Err(StoreError::decode(key, "mapValue.fields is not an object")),
        },
        other => Err(StoreError::decode(key, format!("unsupported value type {other}"))),
    }
}

/// Field path usable in `updateMask.fieldPaths`.
///
/// Simple identifiers are used as-is; anything else is backtick-quoted.
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
