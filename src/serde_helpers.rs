//! Response decoding for the REST clients.
//!
//! With the `tracing` feature enabled, decoding also reports fields the response types do not
//! capture and the exact path at which a response failed to decode.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decodes `value` into `T`, logging unknown fields and failure paths when tracing is enabled.
#[cfg(feature = "tracing")]
pub fn decode_logging_unknown<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    use std::any::type_name;

    tracing::trace!(type_name = %type_name::<T>(), json = %value, "decoding response");

    let original = value.clone();
    let mut unknown_paths: Vec<String> = Vec::new();

    let result: T = serde_ignored::deserialize(value, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        let json = original.to_string();
        let de = &mut serde_json::Deserializer::from_str(&json);
        if let Err(path_err) = serde_path_to_error::deserialize::<_, T>(de) {
            let path = path_err.path().to_string();
            tracing::error!(
                type_name = %type_name::<T>(),
                path = %path,
                value = %display_at(&original, &path),
                error = %path_err.inner(),
                "response decoding failed"
            );
        }
    })?;

    for path in unknown_paths {
        tracing::warn!(
            type_name = %type_name::<T>(),
            field = %path,
            value = %display_at(&original, &path),
            "unknown field in API response"
        );
    }

    Ok(result)
}

#[cfg(not(feature = "tracing"))]
pub fn decode_logging_unknown<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(feature = "tracing")]
fn display_at(value: &Value, path: &str) -> String {
    lookup(value, path).map_or_else(|| "<unable to retrieve>".to_owned(), Value::to_string)
}

/// Walks `path` (as reported by `serde_ignored` or `serde_path_to_error`) through `value`.
///
/// Accepts dotted and bracketed segments, `data[3].token_id` and `data.3.token_id` alike. The
/// `?` segments that mark `Option` layers are skipped.
#[cfg(feature = "tracing")]
fn lookup<'value>(value: &'value Value, path: &str) -> Option<&'value Value> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty() && *segment != "?")
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
}
