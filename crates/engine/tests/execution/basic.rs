use std::{sync::Arc, time::Duration};

use execution_engine::{FieldValue, ParentValue, Request, Resolvers};
use serde_json::json;
use tokio::sync::Notify;

use crate::{engine, execute};

#[tokio::test]
async fn resolves_scalar_fields() {
    let resolvers = Resolvers::default()
        .field("Query", "a", |_| async { Ok(FieldValue::value("hello")) })
        .field("Query", "b", |_| async { Ok(FieldValue::value(42)) });
    let engine = engine("type Query { a: String b: Int }", resolvers);

    let response = execute(&engine, "{ a b }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "a": "hello",
        "b": 42
      }
    }
    "###);
}

#[tokio::test]
async fn nested_objects_use_the_property_resolver() {
    let resolvers = Resolvers::default().field("Query", "parent", |_| async {
        Ok(FieldValue::value(json!({ "child": "value", "other": 1 })))
    });
    let engine = engine("type Query { parent: Parent } type Parent { child: String! other: Int }", resolvers);

    let response = execute(&engine, "{ parent { child } }").await;
    assert_eq!(response, json!({ "data": { "parent": { "child": "value" } } }));
}

#[tokio::test]
async fn root_value_is_the_parent_of_root_fields() {
    let engine = engine("type Query { version: String }", Resolvers::default());

    let request = Request::new("{ version }").root_value(ParentValue::json(json!({ "version": "1.0" })));
    let response = execute(&engine, request).await;
    assert_eq!(response, json!({ "data": { "version": "1.0" } }));
}

#[tokio::test]
async fn response_follows_selection_order_not_completion_order() {
    let notify = Arc::new(Notify::new());
    let resolvers = Resolvers::default()
        .field("Query", "first", {
            let notify = notify.clone();
            move |_| {
                let notify = notify.clone();
                async move {
                    notify.notified().await;
                    Ok(FieldValue::value("slow"))
                }
            }
        })
        .field("Query", "second", {
            let notify = notify.clone();
            move |_| {
                let notify = notify.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    notify.notify_one();
                    Ok(FieldValue::value("fast"))
                }
            }
        });
    let engine = engine("type Query { first: String second: String }", resolvers);

    let response = engine.execute(Request::new("{ first second }")).await;
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"first":"slow","second":"fast"}}"#
    );
}

#[tokio::test]
async fn aliases_and_merged_fields() {
    let resolvers = Resolvers::default().field("Query", "user", |_| async {
        Ok(FieldValue::value(json!({ "id": "1", "name": "Ada", "email": "ada@example.com" })))
    });
    let engine = engine(
        "type Query { user: User } type User { id: ID! name: String email: String }",
        resolvers,
    );

    let response = execute(
        &engine,
        "{ user { id name } user { email } me: user { id } ...F } fragment F on Query { user { name } }",
    )
    .await;
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"data":{"user":{"id":"1","name":"Ada","email":"ada@example.com"},"me":{"id":"1"}}}"#
    );
}

#[tokio::test]
async fn skip_and_include() {
    let engine = engine("type Query { a: Int b: Int c: Int }", Resolvers::default());
    let request = Request::new("query($flag: Boolean!) { a @skip(if: true) b @include(if: $flag) c }")
        .variables(execution_engine::Variables::from_json(json!({ "flag": false })).unwrap())
        .root_value(ParentValue::json(json!({ "a": 1, "b": 2, "c": 3 })));

    let response = execute(&engine, request).await;
    assert_eq!(response, json!({ "data": { "c": 3 } }));
}

#[tokio::test]
async fn merged_fields_keep_the_condition_of_each_occurrence() {
    let resolvers = Resolvers::default().field("Query", "user", |_| async {
        Ok(FieldValue::value(json!({ "id": 1, "name": "Ada" })))
    });
    let engine = engine("type Query { user: User } type User { id: Int name: String }", resolvers);
    let query = "query($a: Boolean!, $b: Boolean!) { user @include(if: $a) { id } user @include(if: $b) { name } }";

    let request = |a: bool, b: bool| {
        Request::new(query).variables(execution_engine::Variables::from_json(json!({ "a": a, "b": b })).unwrap())
    };

    let response = execute(&engine, request(true, false)).await;
    assert_eq!(response, json!({ "data": { "user": { "id": 1 } } }));

    let response = execute(&engine, request(false, true)).await;
    assert_eq!(response, json!({ "data": { "user": { "name": "Ada" } } }));

    let response = execute(&engine, request(true, true)).await;
    assert_eq!(response, json!({ "data": { "user": { "id": 1, "name": "Ada" } } }));

    let response = execute(&engine, request(false, false)).await;
    assert_eq!(response, json!({ "data": {} }));
}

#[tokio::test]
async fn typename_of_objects() {
    let resolvers = Resolvers::default().field("Query", "user", |_| async { Ok(FieldValue::value(json!({}))) });
    let engine = engine("type Query { user: User } type User { name: String }", resolvers);

    let response = execute(&engine, "{ __typename user { __typename name } }").await;
    assert_eq!(
        response,
        json!({ "data": { "__typename": "Query", "user": { "__typename": "User", "name": null } } })
    );
}

#[tokio::test]
async fn opaque_values_with_converters() {
    struct Timestamp(u64);
    struct Event {
        at: Timestamp,
    }

    let resolvers = Resolvers::default()
        .field("Query", "event", |_| async {
            Ok(FieldValue::object(Event { at: Timestamp(1_700_000_000) }))
        })
        .field("Event", "at", |ctx| async move {
            let seconds = ctx.parent.downcast_ref::<Event>().map(|event| event.at.0).unwrap_or_default();
            Ok(FieldValue::object(Timestamp(seconds)))
        })
        .converter("Timestamp", |value| {
            value
                .downcast_ref::<Timestamp>()
                .map(|timestamp| json!(format!("{}s", timestamp.0)))
        });
    let engine = engine("scalar Timestamp type Query { event: Event } type Event { at: Timestamp! }", resolvers);

    let response = execute(&engine, "{ event { at } }").await;
    assert_eq!(response, json!({ "data": { "event": { "at": "1700000000s" } } }));
}
