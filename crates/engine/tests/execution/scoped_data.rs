use execution_engine::{FieldContext, FieldError, FieldResolver, FieldValue, Request, Resolvers};
use serde_json::json;

use crate::{engine, execute};

const SDL: &str = "type Query { tenant: Tenant plain: String } type Tenant { name: String scope: String }";

/// Exposes the tenant to every field selected below it.
struct TenantResolver;

#[async_trait::async_trait]
impl FieldResolver for TenantResolver {
    async fn resolve(&self, ctx: &mut FieldContext) -> Result<FieldValue, FieldError> {
        let name = ctx.data::<String>("tenant").ok_or_else(|| FieldError::new("No tenant"))?;
        ctx.set_child_data("scope", format!("tenant:{name}"));
        Ok(FieldValue::value(json!({ "name": name.as_str() })))
    }
}

fn resolvers() -> Resolvers {
    Resolvers::default()
        .field_resolver("Query", "tenant", TenantResolver)
        .field("Tenant", "scope", |ctx| async move {
            Ok(FieldValue::value(ctx.data::<String>("scope").map(|scope| scope.to_string())))
        })
        .field("Query", "plain", |ctx| async move {
            Ok(FieldValue::value(ctx.data::<String>("scope").map(|scope| scope.to_string())))
        })
}

#[tokio::test]
async fn request_data_reaches_resolvers() {
    let engine = engine(SDL, resolvers());

    let request = Request::new("{ tenant { name } }").data("tenant", "acme".to_string());
    let response = execute(&engine, request).await;
    assert_eq!(response, json!({ "data": { "tenant": { "name": "acme" } } }));
}

#[tokio::test]
async fn child_data_is_only_visible_below_its_field() {
    let engine = engine(SDL, resolvers());

    let request = Request::new("{ tenant { name scope } plain }").data("tenant", "acme".to_string());
    let response = execute(&engine, request).await;
    assert_eq!(
        response,
        json!({ "data": { "tenant": { "name": "acme", "scope": "tenant:acme" }, "plain": null } })
    );
}

#[tokio::test]
async fn missing_data_is_a_field_error() {
    let engine = engine(SDL, resolvers());

    let response = execute(&engine, "{ tenant { name } plain }").await;
    assert_eq!(response["data"], json!({ "tenant": null, "plain": null }));
    assert_eq!(response["errors"][0]["message"], "No tenant");
}
