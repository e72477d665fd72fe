//! Ordering and timing of concurrent versus serial delivery.

mod common;

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use common::*;

struct Scenario {
    gw: TestGateway,
    source_id: uuid::Uuid,
    completions: Completions,
}

/// Three targets answering after 150ms, 10ms and 80ms respectively.
async fn scenario(serial: bool) -> Scenario {
    let completions = Completions::default();
    let slow = start_target(
        "slow",
        MockBehavior::json(200, json!({"name": "slow"})).delayed(Duration::from_millis(150)),
        completions.clone(),
    )
    .await;
    let fast = start_target(
        "fast",
        MockBehavior::json(200, json!({"name": "fast"})).delayed(Duration::from_millis(10)),
        completions.clone(),
    )
    .await;
    let medium = start_target(
        "medium",
        MockBehavior::json(200, json!({"name": "medium"})).delayed(Duration::from_millis(80)),
        completions.clone(),
    )
    .await;

    let targets = vec![
        target("POST", &slow.url, None),
        target("POST", &fast.url, None),
        target("POST", &medium.url, None),
    ];
    let flows = targets.iter().map(|t| flow(None, Some(t))).collect();
    let s = source(flows, None, serial);
    let source_id = s.id;

    Scenario {
        gw: start_gateway(catalog(vec![s], vec![], targets, vec![])).await,
        source_id,
        completions,
    }
}

async fn invoke(scenario: &Scenario) -> (Value, Duration) {
    let started = Instant::now();
    let response = scenario
        .gw
        .client
        .post(scenario.gw.hook_url(scenario.source_id))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();
    assert_eq!(response.status(), 200);
    (response.json().await.unwrap(), elapsed)
}

fn delivered_names(body: &Value) -> Vec<String> {
    body["delivered"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["response"]["body"]["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_concurrent_output_keeps_flow_order() {
    let scenario = scenario(false).await;
    let (body, elapsed) = invoke(&scenario).await;

    assert_eq!(delivered_names(&body), ["slow", "fast", "medium"]);
    // Completion order follows latency, not flow order.
    assert_eq!(*scenario.completions.lock().unwrap(), ["fast", "medium", "slow"]);
    assert!(elapsed < Duration::from_millis(240), "took {elapsed:?}");
}

#[tokio::test]
async fn test_serial_runs_one_at_a_time() {
    let scenario = scenario(true).await;
    let (body, elapsed) = invoke(&scenario).await;

    assert_eq!(delivered_names(&body), ["slow", "fast", "medium"]);
    assert_eq!(*scenario.completions.lock().unwrap(), ["slow", "fast", "medium"]);
    assert!(elapsed >= Duration::from_millis(240), "took {elapsed:?}");
}

#[tokio::test]
async fn test_slow_serial_source_outlives_inbound_timeout() {
    let completions = Completions::default();
    let first = start_target(
        "first",
        MockBehavior::json(200, json!({"name": "first"})).delayed(Duration::from_millis(700)),
        completions.clone(),
    )
    .await;
    let second = start_target(
        "second",
        MockBehavior::json(200, json!({"name": "second"})).delayed(Duration::from_millis(700)),
        completions.clone(),
    )
    .await;
    let targets = vec![target("POST", &first.url, None), target("POST", &second.url, None)];
    let flows = targets.iter().map(|t| flow(None, Some(t))).collect();
    let s = source(flows, None, true);
    let source_id = s.id;

    let mut config = webhook_gateway::config::GatewayConfig::default();
    config.timeouts.request_secs = 1;
    let gw = start_gateway_with(catalog(vec![s], vec![], targets, vec![]), config).await;

    let response = gw.client.post(gw.hook_url(source_id)).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["delivered"].as_array().unwrap().len(), 2);
    assert_eq!(*completions.lock().unwrap(), ["first", "second"]);
}
