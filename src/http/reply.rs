//! [`GatewayReply`] → HTTP response.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use crate::gateway::GatewayReply;
use crate::transform::headers::declares_json;
use crate::transform::TransformedResponse;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

impl IntoResponse for GatewayReply {
    fn into_response(self) -> Response {
        match self {
            GatewayReply::Delivered(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
            GatewayReply::Rejected(error) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": [error] }))).into_response()
            }
            GatewayReply::Templated(reply) => templated(reply),
        }
    }
}

fn templated(reply: TransformedResponse) -> Response {
    // Rendered statuses are already range-checked.
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let is_json = declares_json(reply.headers.as_ref());

    let mut headers = HeaderMap::new();
    for (name, value) in reply.headers.iter().flatten() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping unrepresentable reply header"),
        }
    }

    let body = match reply.body {
        None => Body::empty(),
        Some(Value::String(text)) if !is_json => {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
            }
            Body::from(text)
        }
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap_or_default()),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
