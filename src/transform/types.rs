//! Request-scoped data passed between pipeline stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gateway::errors::ErrorResponse;
use crate::transform::headers::Headers;

/// What templates see of the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub method: String,
    /// Path and query parameters, merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    /// Parsed body: JSON, form object or raw text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Lower-cased header names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    /// Downstream results, present only when rendering the final response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<DeliveryResult>>,
    /// Failures accumulated so far, present only when rendering the final response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorResponse>>,
}

impl Context {
    /// The generic key-value form handed to the template layer.
    pub fn to_json(&self) -> Value {
        // Every field is already a JSON value or a plain struct of them.
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Outbound body: rendered text, or its bytes for binary targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Text(String),
    Binary(Vec<u8>),
}

impl RequestBody {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RequestBody::Text(text) => text.into_bytes(),
            RequestBody::Binary(bytes) => bytes,
        }
    }
}

/// A concrete outbound request built from a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedRequest {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    /// Absent when the flow has no mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

/// Normalized downstream reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownstreamResponse {
    pub status: u16,
    pub headers: Headers,
    /// Decoded JSON, or the body text.
    pub body: Value,
}

/// One outbound request paired with what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub request: TransformedRequest,
    pub response: DownstreamResponse,
}

/// Status, headers and body for the caller, rendered from a response mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    /// Parsed JSON when the headers declare it, text otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}
