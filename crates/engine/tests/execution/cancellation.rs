use std::time::Duration;

use execution_engine::{ExecutionConfig, FieldValue, Request, Resolvers};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{engine, engine_with_config, execute};

fn resolvers() -> Resolvers {
    Resolvers::default()
        .field("Query", "fast", |_| async { Ok(FieldValue::value("fast")) })
        .field("Query", "slow", |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(FieldValue::value("slow"))
        })
}

#[tokio::test]
async fn timeout_returns_what_was_resolved() {
    let engine = engine_with_config(
        "type Query { fast: String slow: String }",
        resolvers(),
        ExecutionConfig {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        },
    );

    let response = tokio::time::timeout(Duration::from_secs(5), execute(&engine, "{ fast slow }"))
        .await
        .unwrap();
    assert_eq!(response, json!({ "data": { "fast": "fast" } }));
}

#[tokio::test]
async fn cancelled_request_stops_scheduling() {
    let engine = engine("type Query { fast: String slow: String }", resolvers());

    let token = CancellationToken::new();
    let request = Request::new("{ fast slow }").cancellation(token.clone());
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    };

    let (response, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        futures::future::join(engine.execute(request), cancel),
    )
    .await
    .unwrap();
    assert_eq!(response.to_json(), json!({ "data": { "fast": "fast" } }));
}

#[tokio::test]
async fn already_cancelled_request_resolves_nothing() {
    let engine = engine("type Query { fast: String slow: String }", resolvers());

    let token = CancellationToken::new();
    token.cancel();
    let response = execute(&engine, Request::new("{ fast }").cancellation(token)).await;
    assert_eq!(response, json!({ "data": {} }));
}
