use execution_engine::{FieldError, FieldValue, Resolvers};
use serde_json::json;

use crate::{engine, error_codes, execute};

#[tokio::test]
async fn lists_of_scalars_and_objects() {
    let resolvers = Resolvers::default()
        .field("Query", "numbers", |_| async {
            Ok(FieldValue::list([FieldValue::value(1), FieldValue::Null, FieldValue::value(3)]))
        })
        .field("Query", "users", |_| async {
            Ok(FieldValue::value(json!([{ "name": "Ada" }, { "name": "Grace" }])))
        })
        .field("Query", "matrix", |_| async { Ok(FieldValue::value(json!([[1, 2], [], [3]]))) });
    let engine = engine(
        "type Query { numbers: [Int] users: [User!]! matrix: [[Int!]!] } type User { name: String }",
        resolvers,
    );

    let response = execute(&engine, "{ numbers users { name } matrix }").await;
    assert_eq!(
        response,
        json!({ "data": {
            "numbers": [1, null, 3],
            "users": [{ "name": "Ada" }, { "name": "Grace" }],
            "matrix": [[1, 2], [], [3]],
        } })
    );
}

#[tokio::test]
async fn lazily_produced_items() {
    let resolvers = Resolvers::default().field("Query", "squares", |_| async {
        Ok(FieldValue::iter((1..=4).map(|n| FieldValue::value(n * n))))
    });
    let engine = engine("type Query { squares: [Int!]! }", resolvers);

    let response = execute(&engine, "{ squares }").await;
    assert_eq!(response, json!({ "data": { "squares": [1, 4, 9, 16] } }));
}

#[tokio::test]
async fn null_non_null_item_nulls_the_list() {
    let resolvers = Resolvers::default()
        .field("Query", "numbers", |_| async { Ok(FieldValue::value(json!([1, null, 3]))) })
        .field("Query", "other", |_| async { Ok(FieldValue::value(true)) });
    let engine = engine("type Query { numbers: [Int!] other: Boolean }", resolvers);

    let response = execute(&engine, "{ numbers other }").await;
    assert_eq!(response["data"], json!({ "numbers": null, "other": true }));
    assert_eq!(
        error_codes(&response),
        [("NON_NULL_VIOLATION".to_string(), json!(["numbers", 1]))]
    );
}

#[tokio::test]
async fn nested_non_null_lists_report_one_error() {
    let resolvers = Resolvers::default()
        .field("Query", "matrix", |_| async { Ok(FieldValue::value(json!([[1, 2], [3, null]]))) })
        .field("Query", "other", |_| async { Ok(FieldValue::value(true)) });
    let engine = engine("type Query { matrix: [[Int!]!] other: Boolean }", resolvers);

    let response = execute(&engine, "{ matrix other }").await;
    assert_eq!(response["data"], json!({ "matrix": null, "other": true }));
    assert_eq!(
        error_codes(&response),
        [("NON_NULL_VIOLATION".to_string(), json!(["matrix", 1, 1]))]
    );
}

#[tokio::test]
async fn null_item_field_propagates_to_the_item() {
    let resolvers = Resolvers::default()
        .field("Query", "users", |_| async {
            Ok(FieldValue::value(json!([{ "name": "Ada" }, { "name": null }])))
        });
    let engine = engine("type Query { users: [User] } type User { name: String! }", resolvers);

    let response = execute(&engine, "{ users { name } }").await;
    assert_eq!(response["data"], json!({ "users": [{ "name": "Ada" }, null] }));
    assert_eq!(
        error_codes(&response),
        [("NON_NULL_VIOLATION".to_string(), json!(["users", 1, "name"]))]
    );
}

#[tokio::test]
async fn null_item_field_propagates_through_non_null_items() {
    let resolvers = Resolvers::default().field("User", "name", |ctx| async move {
        match ctx.parent.as_json().and_then(|user| user.get("id")).and_then(|id| id.as_i64()) {
            Some(2) => Err(FieldError::new("unavailable")),
            _ => Ok(FieldValue::value("someone")),
        }
    });
    let engine = engine("type Query { users: [User!] } type User { id: Int! name: String! }", resolvers);

    let request = execution_engine::Request::new("{ users { id name } }").root_value(execution_engine::ParentValue::json(
        json!({ "users": [{ "id": 1 }, { "id": 2 }] }),
    ));
    let response = execute(&engine, request).await;
    assert_eq!(response["data"], json!({ "users": null }));
    assert_eq!(
        error_codes(&response),
        [("RESOLVER_ERROR".to_string(), json!(["users", 1, "name"]))]
    );
}

#[tokio::test]
async fn non_list_value_for_a_list_field() {
    let resolvers = Resolvers::default().field("Query", "tags", |_| async { Ok(FieldValue::value("single")) });
    let engine = engine("type Query { tags: [String] }", resolvers);

    let response = execute(&engine, "{ tags }").await;
    assert_eq!(response["data"], json!({ "tags": null }));
    assert_eq!(error_codes(&response), [("RESOLVER_ERROR".to_string(), json!(["tags"]))]);
}
