//! Header template parsing and content-type checks.

use std::collections::BTreeMap;

use axum::http::{HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;

/// Flat header map, as rendered by a header template.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("header '{0}' must be a string, number or boolean")]
    UnsupportedValue(String),

    #[error("'{name}: {value}' is not a valid HTTP header")]
    Invalid { name: String, value: String },
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse rendered header text. Scalars are stringified; `null` entries are dropped.
pub fn parse_headers(text: &str) -> Result<Headers, HeaderError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(HeaderError::NotAnObject(type_name(&value)));
    };

    let mut headers = Headers::new();
    for (name, value) in map {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => return Err(HeaderError::UnsupportedValue(name)),
        };
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Check that every entry can go on the wire.
pub fn validate_headers(headers: &Headers) -> Result<(), HeaderError> {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
            return Err(HeaderError::Invalid {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

/// Case-insensitive header lookup.
pub fn find<'a, I>(headers: I, name: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    headers
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// True for `application/json` and `application/*+json`, parameters ignored.
pub fn is_json_content_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Whether `headers` declare a JSON body.
pub fn declares_json(headers: Option<&Headers>) -> bool {
    headers
        .and_then(|h| find(h, "content-type"))
        .is_some_and(is_json_content_type)
}
