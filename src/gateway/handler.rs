//! Gateway Handler: the per-invocation state machine.
//!
//! ```text
//! ValidateId → LoadSource → MapFlows → Dispatch
//!     → no response_id ─────────────────────────────→ envelope (200)
//!     → LoadResponseMapping ─ missing/failed ───────→ envelope (200) + RESPONSE_ID
//!         → TransformResponse ─ failed ─────────────→ envelope (200) + TRANSFORM_RESPONSE
//!                             └ ok ─────────────────→ templated reply
//! ```
//!
//! Only id validation, source lookup and unexpected failures end the
//! invocation with a 400.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::gateway::dispatcher::{DispatchError, Dispatcher};
use crate::gateway::errors::{ErrorEnvelope, ErrorKind, ErrorResponse};
use crate::gateway::flows::{map_flows, MappedFlows};
use crate::observability::metrics;
use crate::store::{ConfigStore, Source};
use crate::template::TemplateRenderer;
use crate::transform::{transform_response, Context, DeliveryResult, TransformedResponse};

/// Length of a hyphenated UUID.
const SOURCE_ID_LEN: usize = 36;

/// Reply shape when no response mapping takes over.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEnvelope {
    pub source_id: String,
    pub context: Context,
    pub delivered: Vec<DeliveryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorResponse>>,
}

/// What the caller receives.
#[derive(Debug, Clone)]
pub enum GatewayReply {
    /// HTTP 200 with the delivery envelope, failures reported in-band.
    Delivered(DeliveryEnvelope),
    /// Rendered by the source's response mapping.
    Templated(TransformedResponse),
    /// Terminal failure, HTTP 400.
    Rejected(ErrorResponse),
}

impl GatewayReply {
    fn outcome(&self) -> &'static str {
        match self {
            GatewayReply::Delivered(_) => "delivered",
            GatewayReply::Templated(_) => "templated",
            GatewayReply::Rejected(_) => "rejected",
        }
    }
}

/// Whether `id` is a canonical (hyphenated UUID) source id.
pub fn is_valid_source_id(id: &str) -> bool {
    id.len() == SOURCE_ID_LEN && Uuid::try_parse(id).is_ok()
}

/// Top-level orchestrator shared by every inbound request.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn ConfigStore>,
    renderer: Arc<TemplateRenderer>,
    dispatcher: Dispatcher,
}

impl Gateway {
    pub fn new(store: Arc<dyn ConfigStore>, renderer: Arc<TemplateRenderer>, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            renderer,
            dispatcher,
        }
    }

    /// Run one invocation for `source_id` with the inbound `context`.
    pub async fn handle(&self, source_id: Option<&str>, context: Context) -> GatewayReply {
        let reply = self.run(source_id, context).await;
        metrics::record_invocation(reply.outcome());
        reply
    }

    async fn run(&self, source_id: Option<&str>, context: Context) -> GatewayReply {
        let Some(id) = source_id.filter(|id| is_valid_source_id(id)) else {
            tracing::warn!(source_id = ?source_id, "Rejected invalid source id");
            return GatewayReply::Rejected(
                ErrorResponse::new(ErrorKind::SourceId)
                    .with_meta("sourceId", source_id.map(str::to_string))
                    .with_meta("context", context.to_json()),
            );
        };

        let source = match self.store.source(id).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::warn!(source_id = %id, "Source not found");
                return GatewayReply::Rejected(
                    ErrorResponse::new(ErrorKind::Database)
                        .with_meta("sourceId", id)
                        .with_meta("details", "source not found"),
                );
            }
            Err(e) => {
                tracing::error!(source_id = %id, error = %e, "Source lookup failed");
                return GatewayReply::Rejected(
                    ErrorResponse::new(ErrorKind::Database)
                        .with_meta("sourceId", id)
                        .with_meta("details", e.to_string()),
                );
            }
        };

        match self.process(&source, context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(source_id = %id, error = %e, "Gateway invocation failed");
                GatewayReply::Rejected(
                    ErrorResponse::new(ErrorKind::Mapper)
                        .with_meta("sourceId", id)
                        .with_meta("details", e.to_string()),
                )
            }
        }
    }

    async fn process(&self, source: &Source, context: Context) -> Result<GatewayReply, DispatchError> {
        let context_json = context.to_json();
        let MappedFlows { requests, errors } =
            map_flows(self.store.as_ref(), &self.renderer, source, &context_json).await;
        let mut errors = errors.unwrap_or_default();

        tracing::info!(
            source = %source.name,
            requests = requests.len(),
            flow_errors = errors.len(),
            serial = source.serial,
            "Dispatching"
        );
        let delivered = self.dispatcher.dispatch(requests, source.serial).await?;

        let Some(response_id) = source.response_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(envelope(source, context, delivered, errors));
        };

        let mapping = match self.store.response_mapping(response_id).await {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                errors.push(
                    ErrorResponse::new(ErrorKind::ResponseId)
                        .with_meta("responseId", response_id)
                        .with_meta("details", "response mapping not found"),
                );
                return Ok(envelope(source, context, delivered, errors));
            }
            Err(e) => {
                tracing::error!(response_id = %response_id, error = %e, "Response mapping lookup failed");
                errors.push(
                    ErrorResponse::new(ErrorKind::ResponseId)
                        .with_meta("responseId", response_id)
                        .with_meta("details", e.to_string()),
                );
                return Ok(envelope(source, context, delivered, errors));
            }
        };

        let response_context = Context {
            responses: Some(delivered.clone()),
            errors: errors.as_option().map(<[ErrorResponse]>::to_vec),
            ..context.clone()
        };
        match transform_response(&self.renderer, &response_context.to_json(), Some(&mapping)) {
            Ok(response) => Ok(GatewayReply::Templated(response)),
            Err(e) => {
                tracing::warn!(response_id = %response_id, error = %e, "Response transform failed");
                errors.push(
                    ErrorResponse::new(ErrorKind::TransformResponse)
                        .with_meta("responseId", response_id)
                        .with_meta("kind", e.kind().code())
                        .with_meta("details", e.to_string()),
                );
                Ok(envelope(source, context, delivered, errors))
            }
        }
    }
}

fn envelope(
    source: &Source,
    context: Context,
    delivered: Vec<DeliveryResult>,
    errors: ErrorEnvelope,
) -> GatewayReply {
    GatewayReply::Delivered(DeliveryEnvelope {
        source_id: source.id.to_string(),
        context,
        delivered,
        errors: errors.into_option(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::store::{Catalog, CatalogStore, Flow, Mapping, ResponseMapping, StoreError, Target};
    use async_trait::async_trait;
    use serde_json::json;

    fn gateway(store: Arc<dyn ConfigStore>) -> Gateway {
        Gateway::new(
            store,
            Arc::new(TemplateRenderer::default()),
            Dispatcher::new(&DispatchConfig::default()).unwrap(),
        )
    }

    fn source(response_id: Option<Uuid>, flows: Vec<Flow>) -> Source {
        Source {
            id: Uuid::new_v4(),
            name: "s".into(),
            flows,
            response_id: response_id.map(|id| id.to_string()),
            serial: false,
        }
    }

    fn response(status: &str, headers: Option<&str>, template: Option<&str>) -> ResponseMapping {
        ResponseMapping {
            id: Uuid::new_v4(),
            name: "r".into(),
            status: Some(status.into()),
            headers: headers.map(Into::into),
            template: template.map(Into::into),
        }
    }

    fn context() -> Context {
        Context {
            method: "POST".into(),
            params: Some(serde_json::Map::new()),
            body: Some(json!({"id": 5})),
            headers: Some(serde_json::Map::new()),
            ..Default::default()
        }
    }

    fn store_with(sources: Vec<Source>, responses: Vec<ResponseMapping>) -> Arc<dyn ConfigStore> {
        Arc::new(CatalogStore::new(
            Catalog::from_parts(sources, vec![], vec![], responses).unwrap(),
        ))
    }

    struct FailingStore;

    #[async_trait]
    impl ConfigStore for FailingStore {
        async fn source(&self, _id: &str) -> Result<Option<Arc<Source>>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
        async fn mapping(&self, _id: &str) -> Result<Option<Arc<Mapping>>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
        async fn target(&self, _id: &str) -> Result<Option<Arc<Target>>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
        async fn response_mapping(&self, _id: &str) -> Result<Option<Arc<ResponseMapping>>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
    }

    #[test]
    fn test_source_id_validation() {
        assert!(is_valid_source_id(&Uuid::new_v4().to_string()));
        assert!(!is_valid_source_id(&Uuid::new_v4().simple().to_string()));
        assert!(!is_valid_source_id("short"));
        assert!(!is_valid_source_id(""));
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_with_context() {
        let reply = gateway(store_with(vec![], vec![])).handle(Some("abc"), context()).await;
        let GatewayReply::Rejected(err) = reply else { panic!("expected rejection") };
        assert_eq!(err.kind(), ErrorKind::SourceId);
        assert_eq!(err.meta["sourceId"], json!("abc"));
        assert_eq!(err.meta["context"]["body"], json!({"id": 5}));

        let reply = gateway(store_with(vec![], vec![])).handle(None, context()).await;
        assert!(matches!(reply, GatewayReply::Rejected(ref e) if e.kind() == ErrorKind::SourceId));
    }

    #[tokio::test]
    async fn test_unknown_source_is_database_error() {
        let id = Uuid::new_v4().to_string();
        let reply = gateway(store_with(vec![], vec![])).handle(Some(&id), context()).await;
        assert!(matches!(reply, GatewayReply::Rejected(ref e) if e.kind() == ErrorKind::Database));
    }

    #[tokio::test]
    async fn test_store_failure_is_database_error() {
        let id = Uuid::new_v4().to_string();
        let reply = gateway(Arc::new(FailingStore)).handle(Some(&id), context()).await;
        let GatewayReply::Rejected(err) = reply else { panic!("expected rejection") };
        assert_eq!(err.kind(), ErrorKind::Database);
        assert!(err.meta["details"].as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_empty_source_envelope() {
        let src = source(None, vec![]);
        let id = src.id.to_string();
        let reply = gateway(store_with(vec![src], vec![])).handle(Some(&id), context()).await;
        let GatewayReply::Delivered(envelope) = reply else { panic!("expected envelope") };
        assert_eq!(envelope.source_id, id);
        assert!(envelope.delivered.is_empty());
        assert!(envelope.errors.is_none());

        let wire = serde_json::to_value(&envelope).unwrap();
        assert!(wire.get("errors").is_none());
        assert_eq!(wire["delivered"], json!([]));
        assert_eq!(wire["sourceId"], json!(id));
    }

    #[tokio::test]
    async fn test_missing_response_mapping_falls_back() {
        let src = source(Some(Uuid::new_v4()), vec![]);
        let id = src.id.to_string();
        let reply = gateway(store_with(vec![src], vec![])).handle(Some(&id), context()).await;
        let GatewayReply::Delivered(envelope) = reply else { panic!("expected envelope") };
        let errors = envelope.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::ResponseId);
    }

    #[tokio::test]
    async fn test_templated_reply() {
        let mapping = response(
            "200",
            Some(r#"{"content-type":"application/json"}"#),
            Some(r#"{"id":{{body.id}}}"#),
        );
        let src = source(Some(mapping.id), vec![]);
        let id = src.id.to_string();
        let reply = gateway(store_with(vec![src], vec![mapping])).handle(Some(&id), context()).await;
        let GatewayReply::Templated(response) = reply else { panic!("expected templated reply") };
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({"id": 5})));
    }

    #[tokio::test]
    async fn test_failed_response_template_falls_back() {
        let mapping = response("{{ nope }}", None, None);
        let src = source(Some(mapping.id), vec![]);
        let id = src.id.to_string();
        let reply = gateway(store_with(vec![src], vec![mapping])).handle(Some(&id), context()).await;
        let GatewayReply::Delivered(envelope) = reply else { panic!("expected envelope") };
        let errors = envelope.errors.unwrap();
        assert_eq!(errors[0].kind(), ErrorKind::TransformResponse);
        assert_eq!(errors[0].meta["kind"], json!("TRANSFORM_RESPONSE"));
    }

    #[tokio::test]
    async fn test_flow_errors_visible_to_response_template() {
        let mapping = response("207", None, Some("{{ errors | length }} {{ errors[0].code }}"));
        let src = source(
            Some(mapping.id),
            vec![Flow {
                mapping_id: None,
                target_id: Some(Uuid::new_v4().to_string()),
            }],
        );
        let id = src.id.to_string();
        let reply = gateway(store_with(vec![src], vec![mapping])).handle(Some(&id), context()).await;
        let GatewayReply::Templated(response) = reply else { panic!("expected templated reply") };
        assert_eq!(response.status, 207);
        assert_eq!(response.body, Some(json!("1 TRANSFORM_SOURCE")));
    }
}
