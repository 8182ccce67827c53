use std::sync::Arc;

use execution_engine::{ErrorCode, ExecutionConfig, FieldValue, OperationCacheConfig, Request, Resolvers};
use serde_json::json;

use crate::{engine, engine_with_config, error_codes, execute};

const SDL: &str = "type Query { a: Int b: Int } type Subscription { tick: Int }";

fn resolvers() -> Resolvers {
    Resolvers::default()
        .field("Query", "a", |_| async { Ok(FieldValue::value(1)) })
        .field("Query", "b", |_| async { Ok(FieldValue::value(2)) })
        .field("Subscription", "tick", |_| async { Ok(FieldValue::value(0)) })
}

#[tokio::test]
async fn named_operation_is_selected() {
    let engine = engine(SDL, resolvers());

    let request = Request::new("query A { a } query B { b }").operation_name("B");
    let response = execute(&engine, request).await;
    assert_eq!(response, json!({ "data": { "b": 2 } }));

    let response = execute(&engine, "query Only { a }").await;
    assert_eq!(response, json!({ "data": { "a": 1 } }));
}

#[tokio::test]
async fn operation_selection_errors() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "query A { a } query B { b }").await;
    assert!(response.get("data").is_none());
    assert_eq!(
        error_codes(&response),
        [("OPERATION_PARSING_ERROR".to_string(), json!(null))]
    );

    let response = execute(&engine, Request::new("query A { a }").operation_name("C")).await;
    assert_eq!(
        response,
        json!({ "errors": [{
            "message": "Unknown operation named 'C'",
            "extensions": { "code": "OPERATION_PARSING_ERROR" }
        }] })
    );
}

#[tokio::test]
async fn syntax_errors() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ a ").await;
    assert!(response.get("data").is_none());
    assert_eq!(
        error_codes(&response),
        [("OPERATION_PARSING_ERROR".to_string(), json!(null))]
    );
}

#[tokio::test]
async fn invalid_selections_are_planning_errors() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ a missing }").await;
    assert_eq!(
        response,
        json!({ "errors": [{
            "message": "Query does not have a field named 'missing'",
            "locations": [{ "line": 1, "column": 5 }],
            "extensions": { "code": "OPERATION_PLANNING_ERROR" }
        }] })
    );

    let response = execute(&engine, "mutation { a }").await;
    assert_eq!(
        error_codes(&response),
        [("OPERATION_PLANNING_ERROR".to_string(), json!(null))]
    );
}

#[tokio::test]
async fn subscription_runs_as_a_single_event() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "subscription { tick }").await;
    assert_eq!(response, json!({ "data": { "tick": 0 } }));
}

#[tokio::test]
async fn compiled_operations_are_cached() {
    let engine = engine(SDL, resolvers());

    let first = engine.prepare("query A { a } query B { b }", Some("A")).unwrap();
    let second = engine.prepare("query A { a } query B { b }", Some("A")).unwrap();
    let other = engine.prepare("query A { a } query B { b }", Some("B")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(other.name(), Some("B"));

    // Failures are not cached.
    let err = engine.prepare("{ missing }", None).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationPlanningError);
    assert!(engine.prepare("{ missing }", None).is_err());
}

#[tokio::test]
async fn cache_can_be_disabled() {
    let engine = engine_with_config(
        SDL,
        resolvers(),
        ExecutionConfig {
            operation_cache: OperationCacheConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        },
    );

    let first = engine.prepare("{ a }", None).unwrap();
    let second = engine.prepare("{ a }", None).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let response = execute(&engine, "{ a b }").await;
    assert_eq!(response, json!({ "data": { "a": 1, "b": 2 } }));
}

#[tokio::test]
async fn configuration_from_toml() {
    let config = ExecutionConfig::from_toml(
        r#"
        workers = 1
        timeout = "2s"

        [operation_cache]
        limit = 10
        "#,
    )
    .unwrap();
    assert_eq!(config.timeout, Some(std::time::Duration::from_secs(2)));

    let engine = engine_with_config(SDL, resolvers(), config);
    assert_eq!(engine.config().workers, 1);
    let response = execute(&engine, "{ a b }").await;
    assert_eq!(response, json!({ "data": { "a": 1, "b": 2 } }));
}
