use std::sync::Arc;

use execution_engine::{
    CompileError, CompiledDirective, DirectiveMiddleware, Engine, ExecutionConfig, FieldContext, FieldError, FieldValue, Next,
    Resolvers, Schema, SelectionSetOptimizerContext,
};
use indoc::indoc;
use serde_json::json;

use crate::{engine, error_codes, execute};

const SDL: &str = indoc! {r#"
    directive @upper on FIELD | FIELD_DEFINITION
    directive @prefix(with: String = "> ") on FIELD
    directive @guard on FIELD_DEFINITION

    type Query {
        greeting: String
        shout: String @upper
        secret: String @guard
    }
"#};

struct Upper;

#[async_trait::async_trait]
impl DirectiveMiddleware for Upper {
    async fn invoke(&self, ctx: &mut FieldContext, _directive: &CompiledDirective, next: Next<'_>) {
        next.run(ctx).await;
        if let Some(Ok(FieldValue::Value(serde_json::Value::String(value)))) = ctx.take_result() {
            ctx.set_result(Ok(FieldValue::value(value.to_uppercase())));
        }
    }
}

struct Prefix;

#[async_trait::async_trait]
impl DirectiveMiddleware for Prefix {
    async fn invoke(&self, ctx: &mut FieldContext, directive: &CompiledDirective, next: Next<'_>) {
        let prefix = directive
            .argument_json("with", ctx.variables())
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        next.run(ctx).await;
        if let Some(Ok(FieldValue::Value(serde_json::Value::String(value)))) = ctx.take_result() {
            ctx.set_result(Ok(FieldValue::value(format!("{prefix}{value}"))));
        }
    }
}

struct Guard;

#[async_trait::async_trait]
impl DirectiveMiddleware for Guard {
    async fn invoke(&self, ctx: &mut FieldContext, _directive: &CompiledDirective, _next: Next<'_>) {
        ctx.set_result(Err(FieldError::new("Not allowed")));
    }
}

fn resolvers() -> Resolvers {
    Resolvers::default()
        .field("Query", "greeting", |_| async { Ok(FieldValue::value("hello")) })
        .field("Query", "shout", |_| async { Ok(FieldValue::value("hey")) })
        .field("Query", "secret", |_| async { Ok(FieldValue::value("hunter2")) })
        .directive("upper", Upper)
        .directive("prefix", Prefix)
        .directive("guard", Guard)
}

#[tokio::test]
async fn query_and_schema_directives_wrap_resolvers() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ greeting @upper shout plain: greeting }").await;
    assert_eq!(
        response,
        json!({ "data": { "greeting": "HELLO", "shout": "HEY", "plain": "hello" } })
    );
}

#[tokio::test]
async fn directive_arguments_and_defaults() {
    let engine = engine(SDL, resolvers());

    let response = execute(
        &engine,
        r##"query($p: String) { a: greeting @prefix(with: "# ") b: greeting @prefix c: greeting @prefix(with: $p) }"##,
    )
    .await;
    assert_eq!(response["data"], json!({ "a": "# hello", "b": "> hello", "c": "hello" }));
}

#[tokio::test]
async fn middlewares_compose_outermost_first() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, r#"{ a: greeting @prefix(with: "x ") @upper b: greeting @upper @prefix(with: "x ") }"#).await;
    assert_eq!(response["data"], json!({ "a": "x HELLO", "b": "X HELLO" }));
}

#[tokio::test]
async fn middleware_can_short_circuit() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ secret greeting }").await;
    assert_eq!(response["data"], json!({ "secret": null, "greeting": "hello" }));
    assert_eq!(error_codes(&response), [("RESOLVER_ERROR".to_string(), json!(["secret"]))]);
}

#[tokio::test]
async fn optimizers_inject_internal_selections() {
    let sdl = "type Query { user: User } type User { id: ID! name: String displayName: String }";
    let resolvers = Resolvers::default()
        .field("Query", "user", |_| async { Ok(FieldValue::value(json!({ "id": "1", "name": "Ada" }))) })
        .field("User", "displayName", |ctx| async move {
            let name = ctx.parent.as_json().and_then(|user| user.get("name")).cloned();
            Ok(FieldValue::value(name.unwrap_or_default()))
        });

    let optimizer = |ctx: &mut SelectionSetOptimizerContext<'_, '_>| -> Result<(), CompileError> {
        if ctx.type_name() == "User" && ctx.contains("displayName") {
            ctx.add_internal_selection("_id", "id")?;
        }
        Ok(())
    };

    let builder = |config: ExecutionConfig| {
        Engine::builder(Arc::new(Schema::parse(sdl).unwrap()))
            .resolvers(resolvers.clone())
            .config(config)
            .optimizer(optimizer)
            .build()
    };

    let engine = builder(ExecutionConfig::default());
    let operation = engine.prepare("{ user { displayName } }", None).unwrap();
    let user = operation.root_selection_set().and_then(|set| set.get("user")).unwrap();
    let selections = operation.collect_fields(user.selection_set().unwrap(), "User").unwrap();
    assert!(selections.get("_id").is_some_and(|selection| selection.is_internal()));

    let response = execute(&engine, "{ user { displayName } }").await;
    assert_eq!(response, json!({ "data": { "user": { "displayName": "Ada" } } }));

    let engine = builder(ExecutionConfig {
        allow_internal_selections: true,
        ..Default::default()
    });
    let response = execute(&engine, "{ user { displayName } }").await;
    assert_eq!(response, json!({ "data": { "user": { "displayName": "Ada", "_id": "1" } } }));
}
