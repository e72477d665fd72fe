//! Flow Mapper: a source's flows → outbound requests + per-flow errors.

use thiserror::Error;

use crate::gateway::errors::{ErrorEnvelope, ErrorKind, ErrorResponse};
use crate::observability::metrics;
use crate::store::{ConfigStore, Flow, Source, StoreError};
use crate::template::TemplateRenderer;
use crate::transform::{transform_request, TransformError, TransformedRequest};

/// Result of mapping every flow of a source.
#[derive(Debug, Default)]
pub struct MappedFlows {
    /// Successfully built requests, in flow order.
    pub requests: Vec<TransformedRequest>,
    /// `None` when every flow transformed cleanly.
    pub errors: Option<ErrorEnvelope>,
}

#[derive(Debug, Error)]
enum FlowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl FlowError {
    fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Store(_) => ErrorKind::Database,
            FlowError::Transform(e) => e.kind(),
        }
    }
}

/// Transform every flow of `source` against the inbound `context`.
///
/// A failing flow adds one `TRANSFORM_SOURCE` entry and is skipped; it never
/// affects its siblings. The entry's `kind` meta names the underlying cause.
pub async fn map_flows(
    store: &dyn ConfigStore,
    renderer: &TemplateRenderer,
    source: &Source,
    context: &serde_json::Value,
) -> MappedFlows {
    let mut requests = Vec::with_capacity(source.flows.len());
    let mut errors = ErrorEnvelope::new();

    for (index, flow) in source.flows.iter().enumerate() {
        match map_flow(store, renderer, flow, context).await {
            Ok(request) => requests.push(request),
            Err(e) => {
                tracing::warn!(
                    source = %source.id,
                    flow = index,
                    mapping = ?flow.mapping_id,
                    target = ?flow.target_id,
                    error = %e,
                    "Flow transform failed"
                );
                metrics::record_flow_error();
                errors.push(
                    ErrorResponse::new(ErrorKind::TransformSource)
                        .with_meta("source", source.id.to_string())
                        .with_meta("mapping", flow.mapping_id.clone())
                        .with_meta("target", flow.target_id.clone())
                        .with_meta("kind", e.kind().code())
                        .with_meta("details", e.to_string()),
                );
            }
        }
    }

    MappedFlows {
        requests,
        errors: if errors.is_empty() { None } else { Some(errors) },
    }
}

async fn map_flow(
    store: &dyn ConfigStore,
    renderer: &TemplateRenderer,
    flow: &Flow,
    context: &serde_json::Value,
) -> Result<TransformedRequest, FlowError> {
    let mapping = match &flow.mapping_id {
        Some(id) => store.mapping(id).await?,
        None => None,
    };
    let target = match &flow.target_id {
        Some(id) => store.target(id).await?,
        None => None,
    };

    let template = mapping.as_ref().and_then(|m| m.template.as_deref());
    Ok(transform_request(renderer, context, template, target.as_deref())?)
}
