use execution_engine::{FieldValue, Request, Resolvers, Variables};
use indoc::indoc;
use serde_json::json;

use crate::{engine, error_codes, execute};

const SDL: &str = indoc! {r#"
    type Query {
        echo(value: Int!, times: Int = 1): [Int!]!
        search(filter: Filter): String
        greet(name: String): String
    }

    input Filter {
        term: String!
        limit: Int = 10
        tags: [String!]
    }
"#};

fn resolvers() -> Resolvers {
    Resolvers::default()
        .field("Query", "echo", |ctx| async move {
            let value = ctx.argument_as::<i64>("value")?.unwrap_or_default();
            let times = ctx.argument_as::<usize>("times")?.unwrap_or_default();
            Ok(FieldValue::list(std::iter::repeat(value).take(times).map(FieldValue::value)))
        })
        .field("Query", "search", |ctx| async move {
            Ok(FieldValue::value(ctx.argument("filter").cloned().unwrap_or_default().to_string()))
        })
        .field("Query", "greet", |ctx| async move {
            Ok(FieldValue::value(ctx.argument("name").cloned().unwrap_or_default()))
        })
}

#[tokio::test]
async fn literal_arguments_with_defaults() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ once: echo(value: 7) twice: echo(value: 3, times: 2) }").await;
    assert_eq!(response, json!({ "data": { "once": [7], "twice": [3, 3] } }));
}

#[tokio::test]
async fn variables_are_substituted() {
    let engine = engine(SDL, resolvers());

    let request = Request::new("query($v: Int!, $t: Int = 3) { echo(value: $v, times: $t) }")
        .variables(Variables::from_json(json!({ "v": 5 })).unwrap());
    let response = execute(&engine, request).await;
    assert_eq!(response, json!({ "data": { "echo": [5, 5, 5] } }));
}

#[tokio::test]
async fn input_objects_are_coerced_recursively() {
    let engine = engine(SDL, resolvers());

    let request = Request::new(r#"query($tag: String!) { search(filter: { term: "rust", tags: [$tag] }) }"#)
        .variables(Variables::from_json(json!({ "tag": "async" })).unwrap());
    let response = execute(&engine, request).await;

    let filter: serde_json::Value = serde_json::from_str(response["data"]["search"].as_str().unwrap()).unwrap();
    assert_eq!(filter, json!({ "term": "rust", "limit": 10, "tags": ["async"] }));
}

#[tokio::test]
async fn omitted_nullable_argument_is_null() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ greet }").await;
    assert_eq!(response, json!({ "data": { "greet": null } }));
}

#[tokio::test]
async fn missing_required_variable_is_a_request_error() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "query($v: Int!) { echo(value: $v) }").await;
    assert!(response.get("data").is_none());
    assert_eq!(
        response["errors"][0]["message"],
        "Variable $v of required type 'Int!' was not provided"
    );
    assert_eq!(error_codes(&response), [("VARIABLE_ERROR".to_string(), json!(null))]);
}

#[tokio::test]
async fn invalid_variable_value_fails_only_its_field() {
    let engine = engine(SDL, resolvers());

    let request = Request::new(r#"query($v: Int!) { echo(value: $v) greet(name: "Ada") }"#)
        .variables(Variables::from_json(json!({ "v": "five" })).unwrap());
    let response = execute(&engine, request).await;
    assert_eq!(response["data"], json!(null));
    assert_eq!(error_codes(&response), [("INVALID_ARGUMENT".to_string(), json!(["echo"]))]);
}

#[tokio::test]
async fn invalid_literal_is_reported_when_the_field_runs() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, r#"{ search(filter: { limit: 1 }) greet(name: "Ada") }"#).await;
    assert_eq!(response["data"], json!({ "search": null, "greet": "Ada" }));
    assert_eq!(error_codes(&response), [("INVALID_ARGUMENT".to_string(), json!(["search"]))]);
}
