//! Model Gateway Integration Tests
//!
//! Retry policy against a scripted provider with paused time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use site_tailor::config::EngineConfig;
use site_tailor::services::gateway::testing::ScriptedProvider;
use site_tailor::services::{ModelGateway, ModelRole};
use site_tailor::AppError;

#[tokio::test(start_paused = true)]
async fn test_recovers_after_rate_limits() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_rate_limited(3, None);
    provider.push_ok("{\"ok\": true}");
    let gateway = ModelGateway::from_config(provider.clone(), &EngineConfig::default());

    let start = Instant::now();
    let value: serde_json::Value = gateway
        .generate_json("status?", ModelRole::Analysis)
        .await
        .unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(provider.call_count(), 4);
    // 1s + 2s + 4s
    assert_eq!(start.elapsed().as_secs(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_at_the_attempt_cap() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_rate_limited(10, Some(1));
    let gateway = ModelGateway::new(provider.clone()).with_retry_policy(3, 60);

    let err = gateway.generate("hi", ModelRole::Code).await.unwrap_err();
    assert!(matches!(err, AppError::RateLimited { .. }));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_waits_are_capped() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_rate_limited(1, Some(600));
    provider.push_ok("done");
    let gateway = ModelGateway::new(provider).with_retry_policy(5, 30);

    let start = Instant::now();
    assert_eq!(gateway.generate("hi", ModelRole::Test).await.unwrap(), "done");
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(start.elapsed() < Duration::from_secs(31));
}
