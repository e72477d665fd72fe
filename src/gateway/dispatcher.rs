//! Dispatcher: send transformed requests downstream and normalize replies.
//!
//! # Disciplines
//! - concurrent: every request is in flight at once; latency ≈ the slowest
//! - serial: one request at a time, in input order; latency ≈ the sum
//!
//! Either way the output is index-aligned with the input.

use std::collections::btree_map::Entry;
use std::time::{Duration, Instant};

use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::join_all;
use serde_json::Value;
use thiserror::Error;

use crate::config::DispatchConfig;
use crate::observability::metrics;
use crate::transform::headers::{find, is_json_content_type};
use crate::transform::{DeliveryResult, DownstreamResponse, Headers, TransformedRequest};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid method '{0}'")]
    Method(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outbound HTTP executor.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    /// Build a dispatcher with the configured user agent and per-call timeout.
    ///
    /// The configured user agent is always the one sent; a target cannot
    /// replace it through its header template.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().map_err(DispatchError::Client)?;
        Ok(Self { client })
    }

    /// Execute `requests`, concurrently or one after another.
    ///
    /// Every request runs to completion before an error is returned, so a
    /// transport failure on one never cancels deliveries already in flight.
    pub async fn dispatch(
        &self,
        requests: Vec<TransformedRequest>,
        serial: bool,
    ) -> Result<Vec<DeliveryResult>, DispatchError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        if serial {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.deliver(request).await?);
            }
            Ok(results)
        } else {
            join_all(requests.into_iter().map(|request| self.deliver(request)))
                .await
                .into_iter()
                .collect()
        }
    }

    async fn deliver(&self, request: TransformedRequest) -> Result<DeliveryResult, DispatchError> {
        let method = if request.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(request.method.as_bytes())
                .map_err(|_| DispatchError::Method(request.method.clone()))?
        };

        let mut builder = self.client.request(method.clone(), &request.url);
        if let Some(headers) = &request.headers {
            for (name, value) in headers {
                if name.eq_ignore_ascii_case(USER_AGENT.as_str()) {
                    tracing::debug!(url = %request.url, "Ignoring target user-agent header");
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if method != Method::GET && method != Method::HEAD {
            if let Some(body) = &request.body {
                builder = builder.body(body.clone().into_bytes());
            }
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|source| DispatchError::Transport {
            url: request.url.clone(),
            source,
        })?;

        let status = response.status();
        let headers = flatten_headers(response.headers());
        let body = decode_body(status, &headers, response).await;

        tracing::debug!(
            method = %method,
            url = %request.url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Delivered"
        );
        metrics::record_delivery(method.as_str(), status.as_u16(), started);

        Ok(DeliveryResult {
            request,
            response: DownstreamResponse {
                status: status.as_u16(),
                headers,
                body,
            },
        })
    }
}

/// Collapse a multi-valued header map into `name → "v1, v2"`.
fn flatten_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes());
        match headers.entry(name.as_str().to_string()) {
            Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(e) => {
                e.insert(value.into_owned());
            }
        }
    }
    headers
}

/// JSON when declared (and not 204), text otherwise; undecodable bodies become `""`.
async fn decode_body(status: StatusCode, headers: &Headers, response: reqwest::Response) -> Value {
    let Ok(bytes) = response.bytes().await else {
        return Value::String(String::new());
    };

    let is_json = status != StatusCode::NO_CONTENT
        && find(headers, "content-type").is_some_and(is_json_content_type);
    if is_json {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::new()))
    } else {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    }
}
