//! Request Transformer: (context, mapping template, target) → outbound request.

use axum::http::Method;
use serde::de::IgnoredAny;
use url::Url;

use crate::store::{Encoding, Target};
use crate::template::{ContextMode, TemplateRenderer};
use crate::transform::error::TransformError;
use crate::transform::headers::{declares_json, parse_headers, validate_headers};
use crate::transform::types::{RequestBody, TransformedRequest};

/// Build the outbound request for one flow.
///
/// URL and header templates see the raw context; the body template sees the
/// null-safe one. A JSON body is validated but sent exactly as rendered.
pub fn transform_request(
    renderer: &TemplateRenderer,
    context: &serde_json::Value,
    body_template: Option<&str>,
    target: Option<&Target>,
) -> Result<TransformedRequest, TransformError> {
    let target = target.ok_or(TransformError::TargetNotFound)?;

    let method = match target.method.as_deref() {
        None | Some("") => Method::GET,
        Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| TransformError::InvalidMethod(method.to_string()))?,
    };

    let url = renderer
        .render_json(context, ContextMode::Raw, Some(&target.url))
        .map_err(|source| TransformError::TargetTemplate { field: "url", source })?
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| TransformError::InvalidUrl(target.url.clone()))?;
    Url::parse(&url).map_err(|_| TransformError::InvalidUrl(url.clone()))?;

    let headers = renderer
        .render_json(context, ContextMode::Raw, target.headers.as_deref())
        .map_err(|source| TransformError::TargetTemplate { field: "headers", source })?
        .map(|text| parse_headers(&text).map_err(TransformError::TargetHeaders))
        .transpose()?;
    if let Some(headers) = &headers {
        validate_headers(headers).map_err(TransformError::HeaderFormat)?;
    }

    let mut request = TransformedRequest {
        method: method.to_string(),
        url,
        headers,
        body: None,
    };

    let Some(text) = renderer
        .render_json(context, ContextMode::NullSafe, body_template)
        .map_err(TransformError::MappingTemplate)?
    else {
        return Ok(request);
    };

    if declares_json(request.headers.as_ref()) {
        serde_json::from_str::<IgnoredAny>(&text).map_err(TransformError::MappingFormat)?;
    }

    request.body = Some(match target.encoding {
        Some(Encoding::Binary) => RequestBody::Binary(text.into_bytes()),
        _ => RequestBody::Text(text),
    });
    Ok(request)
}
