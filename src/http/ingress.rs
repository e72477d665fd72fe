//! Inbound request → [`Context`].
//!
//! # Rules
//! - `params`: query string pairs, then the path's `source_id` on top
//! - `headers`: lower-cased names, repeated headers joined with `", "`
//! - `body`: JSON, form object or text by content type; absent for empty
//!   bodies and for GET/HEAD. Unparseable JSON is kept as text.

use axum::http::{header, HeaderMap, Method};
use serde_json::{Map, Value};

use crate::transform::headers::is_json_content_type;
use crate::transform::Context;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the template context for one inbound request.
pub fn build_context(
    method: &Method,
    source_id: Option<&str>,
    query: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Context {
    let mut params = query.map(decode_pairs).unwrap_or_default();
    if let Some(id) = source_id {
        params.insert("source_id".to_string(), Value::String(id.to_string()));
    }

    Context {
        method: method.as_str().to_ascii_uppercase(),
        params: Some(params),
        body: parse_body(method, headers, body),
        headers: Some(header_map(headers)),
        ..Default::default()
    }
}

/// Decode `a=1&b=2` into an object; a repeated key keeps its last value.
fn decode_pairs(encoded: &str) -> Map<String, Value> {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(encoded) {
        Ok(pairs) => pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring undecodable form data");
            Map::new()
        }
    }
}

fn header_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_ascii_lowercase(), Value::String(joined));
    }
    map
}

fn parse_body(method: &Method, headers: &HeaderMap, body: &[u8]) -> Option<Value> {
    if body.is_empty() || method == Method::GET || method == Method::HEAD {
        return None;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let text = || Value::String(String::from_utf8_lossy(body).into_owned());

    if is_json_content_type(content_type) {
        return Some(serde_json::from_slice(body).unwrap_or_else(|_| text()));
    }

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        return Some(match std::str::from_utf8(body) {
            Ok(encoded) => Value::Object(decode_pairs(encoded)),
            Err(_) => text(),
        });
    }

    Some(text())
}
