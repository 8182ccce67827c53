use execution_engine::{FieldError, FieldValue, Resolvers};
use serde_json::json;

use crate::{engine, error_codes, execute};

#[tokio::test]
async fn null_non_null_root_field_nulls_data() {
    let resolvers = Resolvers::default().field("Query", "a", |_| async { Ok(FieldValue::Null) });
    let engine = engine("type Query { a: String! }", resolvers);

    let response = execute(&engine, "{ a }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": null,
      "errors": [
        {
          "message": "Cannot return null for non-nullable field 'a'",
          "path": [
            "a"
          ],
          "extensions": {
            "code": "NON_NULL_VIOLATION"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn null_propagates_to_the_nearest_nullable_parent() {
    let resolvers = Resolvers::default()
        .field("Query", "parent", |_| async { Ok(FieldValue::value(json!({}))) })
        .field("Parent", "child", |_| async { Ok(FieldValue::Null) })
        .field("Query", "sibling", |_| async { Ok(FieldValue::value("kept")) });
    let engine = engine(
        "type Query { parent: Parent sibling: String } type Parent { child: String! other: Int }",
        resolvers,
    );

    let response = execute(&engine, "{ parent { child other } sibling }").await;
    assert_eq!(response["data"], json!({ "parent": null, "sibling": "kept" }));
    assert_eq!(
        error_codes(&response),
        [("NON_NULL_VIOLATION".to_string(), json!(["parent", "child"]))]
    );
}

#[tokio::test]
async fn propagation_through_several_non_null_levels() {
    let resolvers = Resolvers::default()
        .field("Query", "a", |_| async { Ok(FieldValue::value(json!({}))) })
        .field("A", "b", |_| async { Ok(FieldValue::value(json!({}))) })
        .field("B", "c", |_| async { Ok(FieldValue::Null) });
    let engine = engine("type Query { a: A } type A { b: B! } type B { c: Int! }", resolvers);

    let response = execute(&engine, "{ a { b { c } } }").await;
    assert_eq!(response["data"], json!({ "a": null }));
    assert_eq!(
        error_codes(&response),
        [("NON_NULL_VIOLATION".to_string(), json!(["a", "b", "c"]))]
    );
}

#[tokio::test]
async fn resolver_error_is_not_reported_twice() {
    let resolvers = Resolvers::default()
        .field("Query", "a", |_| async { Err(FieldError::new("boom")) })
        .field("Query", "b", |_| async { Ok(FieldValue::value("b")) });
    let engine = engine("type Query { a: String! b: String }", resolvers);

    let response = execute(&engine, "{ a b }").await;
    assert_eq!(response["data"], json!(null));
    assert_eq!(error_codes(&response), [("RESOLVER_ERROR".to_string(), json!(["a"]))]);
    assert_eq!(response["errors"][0]["message"], "boom");
    assert_eq!(response["errors"][0]["locations"], json!([{ "line": 1, "column": 3 }]));
}

#[tokio::test]
async fn error_values_and_extensions() {
    let resolvers = Resolvers::default()
        .field("Query", "a", |_| async {
            Ok(FieldValue::Error(FieldError::new("denied").with_extension("reason", "forbidden")))
        })
        .field("Query", "b", |_| async {
            Ok(FieldValue::Errors(vec![FieldError::new("first"), FieldError::new("second")]))
        });
    let engine = engine("type Query { a: String b: String }", resolvers);

    let response = execute(&engine, "{ a b }").await;
    assert_eq!(response["data"], json!({ "a": null, "b": null }));
    assert_eq!(
        response["errors"][0]["extensions"],
        json!({ "reason": "forbidden", "code": "RESOLVER_ERROR" })
    );
    assert_eq!(
        error_codes(&response),
        [
            ("RESOLVER_ERROR".to_string(), json!(["a"])),
            ("RESOLVER_ERROR".to_string(), json!(["b"])),
            ("RESOLVER_ERROR".to_string(), json!(["b"])),
        ]
    );
}

#[tokio::test]
async fn panicking_resolver_is_an_internal_error() {
    let resolvers = Resolvers::default()
        .field("Query", "a", |_| async {
            let value: Option<FieldValue> = None;
            Ok(value.expect("resolver bug"))
        })
        .field("Query", "b", |_| async { Ok(FieldValue::value(1)) });
    let engine = engine("type Query { a: String b: Int }", resolvers);

    let response = execute(&engine, "{ a b }").await;
    assert_eq!(response["data"], json!({ "a": null, "b": 1 }));
    assert_eq!(error_codes(&response), [("INTERNAL_SERVER_ERROR".to_string(), json!(["a"]))]);
}

#[tokio::test]
async fn invalid_leaf_value() {
    let resolvers = Resolvers::default().field("Query", "count", |_| async { Ok(FieldValue::value("many")) });
    let engine = engine("type Query { count: Int }", resolvers);

    let response = execute(&engine, "{ count }").await;
    assert_eq!(response["data"], json!({ "count": null }));
    assert_eq!(
        error_codes(&response),
        [("LEAF_SERIALIZATION_ERROR".to_string(), json!(["count"]))]
    );
}

#[tokio::test]
async fn enum_values_are_checked() {
    let resolvers = Resolvers::default()
        .field("Query", "good", |_| async { Ok(FieldValue::value("RED")) })
        .field("Query", "bad", |_| async { Ok(FieldValue::value("PURPLE")) });
    let engine = engine("enum Color { RED GREEN } type Query { good: Color bad: Color }", resolvers);

    let response = execute(&engine, "{ good bad }").await;
    assert_eq!(response["data"], json!({ "good": "RED", "bad": null }));
    assert_eq!(
        error_codes(&response),
        [("LEAF_SERIALIZATION_ERROR".to_string(), json!(["bad"]))]
    );
}

#[tokio::test]
async fn errors_are_ordered_by_path() {
    let resolvers = Resolvers::default()
        .field("Query", "b", |_| async { Err(FieldError::new("b")) })
        .field("Query", "a", |_| async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Err(FieldError::new("a"))
        });
    let engine = engine("type Query { a: Int b: Int }", resolvers);

    let response = execute(&engine, "{ b a }").await;
    assert_eq!(
        error_codes(&response),
        [
            ("RESOLVER_ERROR".to_string(), json!(["a"])),
            ("RESOLVER_ERROR".to_string(), json!(["b"])),
        ]
    );
}
