//! Response Transformer: (context + downstream results, response mapping) → reply.

use std::ops::Range;

use crate::store::ResponseMapping;
use crate::template::{ContextMode, TemplateRenderer};
use crate::transform::error::TransformError;
use crate::transform::headers::{declares_json, parse_headers};
use crate::transform::types::TransformedResponse;

const VALID_STATUS: Range<i64> = 100..600;

/// What a missing status template "renders" to.
const UNDEFINED: &str = "undefined";

/// Render the caller-facing reply.
///
/// `context` carries `responses` and `errors` in addition to the inbound
/// request fields.
pub fn transform_response(
    renderer: &TemplateRenderer,
    context: &serde_json::Value,
    mapping: Option<&ResponseMapping>,
) -> Result<TransformedResponse, TransformError> {
    let mapping = mapping.ok_or(TransformError::InvalidResponse)?;

    let status = renderer
        .render_json(context, ContextMode::Raw, mapping.status.as_deref())
        .map_err(|source| TransformError::ResponseTemplate { field: "status", source })?
        .unwrap_or_else(|| UNDEFINED.to_string());
    let status = parse_status(&status).ok_or(TransformError::InvalidStatus(status))?;

    let headers = renderer
        .render_json(context, ContextMode::Raw, mapping.headers.as_deref())
        .map_err(|source| TransformError::ResponseTemplate { field: "headers", source })?
        .map(|text| parse_headers(&text).map_err(TransformError::ResponseHeaders))
        .transpose()?;

    let Some(text) = renderer
        .render_json(context, ContextMode::NullSafe, mapping.template.as_deref())
        .map_err(|source| TransformError::ResponseTemplate { field: "template", source })?
    else {
        return Ok(TransformedResponse {
            status,
            headers,
            body: None,
        });
    };

    let body = if declares_json(headers.as_ref()) {
        serde_json::from_str::<serde_json::Value>(&text)
            .map_err(|source| TransformError::ResponseFormat { text: text.clone(), source })?
    } else {
        serde_json::Value::String(text)
    };

    Ok(TransformedResponse {
        status,
        headers,
        body: Some(body),
    })
}

fn parse_status(rendered: &str) -> Option<u16> {
    rendered
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|status| VALID_STATUS.contains(status))
        .and_then(|status| u16::try_from(status).ok())
}
