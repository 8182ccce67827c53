use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use execution_engine::{FieldError, FieldValue, ResolverContext, Resolvers};
use parking_lot::Mutex;
use serde_json::json;

use crate::{engine, error_codes, execute};

const SDL: &str = "type Query { ok: Boolean } type Mutation { first: Int second: Int! third: Int }";

type Log = Arc<Mutex<Vec<String>>>;
type Resolution = Pin<Box<dyn Future<Output = Result<FieldValue, FieldError>> + Send>>;

fn step(
    log: &Log,
    name: &'static str,
    delay: u64,
    value: Option<i64>,
) -> impl Fn(ResolverContext) -> Resolution + Send + Sync + 'static {
    let log = log.clone();
    move |_: ResolverContext| -> Resolution {
        let log = log.clone();
        Box::pin(async move {
            log.lock().push(format!("{name} started"));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            log.lock().push(format!("{name} finished"));
            match value {
                Some(value) => Ok(FieldValue::value(value)),
                None => Err(FieldError::new("failed")),
            }
        })
    }
}

fn resolvers(log: &Log) -> Resolvers {
    Resolvers::default()
        .field("Mutation", "first", step(log, "first", 30, Some(1)))
        .field("Mutation", "second", step(log, "second", 0, Some(2)))
        .field("Mutation", "third", step(log, "third", 10, None))
}

#[tokio::test]
async fn root_mutation_fields_run_one_after_the_other() {
    let log = Log::default();
    let engine = engine(SDL, resolvers(&log));

    let response = execute(&engine, "mutation { first second }").await;
    assert_eq!(response, json!({ "data": { "first": 1, "second": 2 } }));
    assert_eq!(
        *log.lock(),
        ["first started", "first finished", "second started", "second finished"]
    );
}

#[tokio::test]
async fn failing_mutation_does_not_stop_the_next_ones() {
    let log = Log::default();
    let engine = engine(SDL, resolvers(&log));

    let response = execute(&engine, "mutation { third first }").await;
    assert_eq!(response["data"], json!({ "third": null, "first": 1 }));
    assert_eq!(error_codes(&response), [("RESOLVER_ERROR".to_string(), json!(["third"]))]);
    assert_eq!(
        *log.lock(),
        ["third started", "third finished", "first started", "first finished"]
    );
}

#[tokio::test]
async fn query_root_fields_run_concurrently() {
    let log = Log::default();
    let slow = step(&log, "slow", 30, Some(1));
    let fast = step(&log, "fast", 0, Some(2));
    let engine = engine(
        "type Query { slow: Int fast: Int }",
        Resolvers::default().field("Query", "slow", slow).field("Query", "fast", fast),
    );

    let response = execute(&engine, "{ slow fast }").await;
    assert_eq!(response, json!({ "data": { "slow": 1, "fast": 2 } }));
    assert_eq!(
        *log.lock(),
        ["slow started", "fast started", "fast finished", "slow finished"]
    );
}
