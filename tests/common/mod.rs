//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

use webhook_gateway::config::{DispatchConfig, GatewayConfig};
use webhook_gateway::gateway::Dispatcher;
use webhook_gateway::store::{
    Catalog, CatalogStore, Encoding, Flow, Mapping, ResponseMapping, Source, Target,
};
use webhook_gateway::template::TemplateRenderer;
use webhook_gateway::{Gateway, HttpServer};

/// Names of mock targets, in the order they finished responding.
pub type Completions = Arc<Mutex<Vec<String>>>;

/// What a mock downstream does with every request.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub status: u16,
    pub delay: Duration,
    /// Sent as JSON when present; empty body otherwise.
    pub body: Option<Value>,
}

impl MockBehavior {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            delay: Duration::ZERO,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            delay: Duration::ZERO,
            body: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

pub struct MockTarget {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockTarget {
    pub fn received(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable downstream on an ephemeral port.
pub async fn start_target(name: &str, behavior: MockBehavior, completions: Completions) -> MockTarget {
    let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
    let recorder = requests.clone();
    let name = name.to_string();

    let app = Router::new().fallback(move |method: Method, headers: HeaderMap, body: Bytes| {
        let recorder = recorder.clone();
        let completions = completions.clone();
        let behavior = behavior.clone();
        let name = name.clone();
        async move {
            recorder.lock().unwrap().push(Recorded {
                method: method.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect(),
                body: body.to_vec(),
            });
            tokio::time::sleep(behavior.delay).await;
            completions.lock().unwrap().push(name);

            let status = StatusCode::from_u16(behavior.status).unwrap();
            match behavior.body {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            }
        }
    });

    let addr = serve(app).await;
    MockTarget {
        url: format!("http://{addr}/"),
        requests,
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An in-process gateway serving `catalog`.
pub struct TestGateway {
    pub base_url: String,
    pub store: Arc<CatalogStore>,
    pub client: reqwest::Client,
}

impl TestGateway {
    pub fn hook_url(&self, source_id: impl std::fmt::Display) -> String {
        format!("{}/hooks/{}", self.base_url, source_id)
    }
}

pub async fn start_gateway(catalog: Catalog) -> TestGateway {
    start_gateway_with(catalog, GatewayConfig::default()).await
}

/// Like [`start_gateway`], with the listener side configured by `config`.
pub async fn start_gateway_with(catalog: Catalog, config: GatewayConfig) -> TestGateway {
    let store = Arc::new(CatalogStore::new(catalog));
    let gateway = Gateway::new(
        store.clone(),
        Arc::new(TemplateRenderer::default()),
        Dispatcher::new(&DispatchConfig {
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap(),
    );
    let router = HttpServer::new(config, gateway).router();
    let addr = serve(router).await;

    TestGateway {
        base_url: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
    }
}

pub fn mapping(template: &str) -> Mapping {
    Mapping {
        id: Uuid::new_v4(),
        name: "mapping".into(),
        template: Some(template.into()),
    }
}

pub fn target(method: &str, url: &str, headers: Option<&str>) -> Target {
    Target {
        id: Uuid::new_v4(),
        name: "target".into(),
        method: Some(method.into()),
        url: url.into(),
        headers: headers.map(Into::into),
        encoding: None,
    }
}

pub fn binary(mut target: Target) -> Target {
    target.encoding = Some(Encoding::Binary);
    target
}

pub fn response(status: &str, headers: Option<&str>, template: Option<&str>) -> ResponseMapping {
    ResponseMapping {
        id: Uuid::new_v4(),
        name: "response".into(),
        status: Some(status.into()),
        headers: headers.map(Into::into),
        template: template.map(Into::into),
    }
}

pub fn flow(mapping: Option<&Mapping>, target: Option<&Target>) -> Flow {
    Flow {
        mapping_id: mapping.map(|m| m.id.to_string()),
        target_id: target.map(|t| t.id.to_string()),
    }
}

pub fn source(flows: Vec<Flow>, response: Option<&ResponseMapping>, serial: bool) -> Source {
    Source {
        id: Uuid::new_v4(),
        name: "source".into(),
        flows,
        response_id: response.map(|r| r.id.to_string()),
        serial,
    }
}

pub fn catalog(
    sources: Vec<Source>,
    mappings: Vec<Mapping>,
    targets: Vec<Target>,
    responses: Vec<ResponseMapping>,
) -> Catalog {
    Catalog::from_parts(sources, mappings, targets, responses).unwrap()
}
