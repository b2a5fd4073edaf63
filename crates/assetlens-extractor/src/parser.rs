//! Parse service replies into extracted attributes

use crate::error::ExtractionError;
use assetlens_domain::{AttributeField, AttributeSet, ExtractedAttributes};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// First brace-delimited span without nested closing braces
///
/// Same match as the pattern `\{[^}]*\}`: from the first `{` up to the
/// first `}` after it.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = start + text[start..].find('}')?;
    Some(&text[start..=end])
}

/// String form of a truthy value
///
/// Non-empty strings and non-zero numbers count; everything else is dropped.
fn truthy(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn attributes_from_object(
    object: &Map<String, Value>,
    input: &str,
    normalize_model: bool,
) -> AttributeSet {
    let mut attributes = AttributeSet::new();

    for (key, value) in object {
        let field = match AttributeField::from_key(key) {
            Ok(field) => field,
            Err(_) => {
                debug!("Ignoring unexpected key '{}' in reply", key);
                continue;
            }
        };
        if field == AttributeField::Model {
            continue;
        }
        if let Some(text) = truthy(value) {
            attributes.insert(field, text);
        }
    }

    let normalized = object.get("model").and_then(truthy).filter(|_| normalize_model);
    attributes.insert(AttributeField::Model, normalized.unwrap_or_else(|| input.to_string()));
    attributes
}

/// Turn a raw reply into the attributes for `input`
///
/// `model` carries the input text unless `normalize_model` is set and the
/// reply supplied a truthy model.
pub fn parse_reply(
    raw: &str,
    input: &str,
    normalize_model: bool,
) -> Result<ExtractedAttributes, ExtractionError> {
    let malformed = || ExtractionError::MalformedResponse { raw: raw.to_string() };

    let span = first_json_object(raw).ok_or_else(malformed)?;
    let value: Value = serde_json::from_str(span).map_err(|e| {
        warn!("Reply span is not valid JSON: {}", e);
        malformed()
    })?;
    let object = value.as_object().ok_or_else(malformed)?;

    Ok(ExtractedAttributes::new(
        input,
        attributes_from_object(object, input, normalize_model),
    ))
}
