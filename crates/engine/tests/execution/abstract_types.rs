use execution_engine::{FieldValue, ParentValue, Resolvers};
use indoc::indoc;
use serde_json::json;

use crate::{engine, error_codes, execute};

const SDL: &str = indoc! {r#"
    type Query {
        search: [SearchResult!]!
        node: Node
    }

    union SearchResult = User | Post

    interface Node {
        id: ID!
    }

    type User implements Node {
        id: ID!
        name: String
    }

    type Post implements Node {
        id: ID!
        title: String
    }
"#};

const QUERY: &str = indoc! {r#"
    {
        search {
            __typename
            ... on User { name }
            ... on Post { title }
            ... on Node { id }
        }
    }
"#};

#[tokio::test]
async fn typename_key_resolves_the_concrete_type() {
    let resolvers = Resolvers::default().field("Query", "search", |_| async {
        Ok(FieldValue::value(json!([
            { "__typename": "User", "id": "u1", "name": "Ada" },
            { "__typename": "Post", "id": "p1", "title": "Notes" },
        ])))
    });
    let engine = engine(SDL, resolvers);

    let response = execute(&engine, QUERY).await;
    assert_eq!(
        response,
        json!({ "data": { "search": [
            { "__typename": "User", "name": "Ada", "id": "u1" },
            { "__typename": "Post", "title": "Notes", "id": "p1" },
        ] } })
    );
}

#[tokio::test]
async fn registered_type_resolver_takes_precedence() {
    let resolvers = Resolvers::default()
        .field("Query", "search", |_| async {
            Ok(FieldValue::value(json!([{ "id": "u1", "name": "Ada" }, { "id": "p1", "title": "Notes" }])))
        })
        .abstract_type("SearchResult", |value: &ParentValue| {
            let json = value.as_json()?;
            Some(if json.get("title").is_some() { "Post" } else { "User" }.to_string())
        });
    let engine = engine(SDL, resolvers);

    let response = execute(&engine, QUERY).await;
    assert_eq!(
        response["data"]["search"],
        json!([
            { "__typename": "User", "name": "Ada", "id": "u1" },
            { "__typename": "Post", "title": "Notes", "id": "p1" },
        ])
    );
}

#[tokio::test]
async fn opaque_values_carry_their_type() {
    struct Post {
        id: &'static str,
    }

    let resolvers = Resolvers::default()
        .field("Query", "node", |_| async { Ok(FieldValue::object(Post { id: "p1" }).with_type("Post")) })
        .field("Post", "id", |ctx| async move {
            Ok(FieldValue::value(ctx.parent.downcast_ref::<Post>().map(|post| post.id)))
        });
    let engine = engine(SDL, resolvers);

    let response = execute(&engine, "{ node { __typename id ... on User { name } } }").await;
    assert_eq!(response, json!({ "data": { "node": { "__typename": "Post", "id": "p1" } } }));
}

#[tokio::test]
async fn unresolvable_type_is_an_error() {
    let resolvers = Resolvers::default()
        .field("Query", "node", |_| async { Ok(FieldValue::value(json!({ "id": "1" }))) })
        .field("Query", "search", |_| async {
            Ok(FieldValue::value(json!([{ "__typename": "Comment", "id": "c1" }])))
        });
    let engine = engine(SDL, resolvers);

    let response = execute(&engine, "{ node { id } }").await;
    assert_eq!(response["data"], json!({ "node": null }));
    assert_eq!(
        error_codes(&response),
        [("ABSTRACT_TYPE_RESOLUTION_ERROR".to_string(), json!(["node"]))]
    );

    let response = execute(&engine, "{ search { __typename } }").await;
    assert_eq!(response["data"], json!(null));
    assert_eq!(
        error_codes(&response),
        [("ABSTRACT_TYPE_RESOLUTION_ERROR".to_string(), json!(["search", 0]))]
    );
}
