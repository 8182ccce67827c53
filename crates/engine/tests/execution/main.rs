mod abstract_types;
mod arguments;
mod basic;
mod cancellation;
mod directives;
mod errors;
mod lists;
mod mutations;
mod operations;
mod scoped_data;

use std::sync::Arc;

use execution_engine::{Engine, ExecutionConfig, Request, Resolvers, Schema};

#[ctor::ctor]
fn setup_logging() {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .parse(std::env::var("RUST_LOG").unwrap_or("execution_engine=debug".to_string()))
        .unwrap();
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .without_time()
        .with_test_writer()
        .init();
}

pub fn engine(sdl: &str, resolvers: Resolvers) -> Engine {
    engine_with_config(sdl, resolvers, ExecutionConfig::default())
}

pub fn engine_with_config(sdl: &str, resolvers: Resolvers, config: ExecutionConfig) -> Engine {
    Engine::builder(Arc::new(Schema::parse(sdl).unwrap()))
        .resolvers(resolvers)
        .config(config)
        .build()
}

pub async fn execute(engine: &Engine, request: impl Into<RequestInput>) -> serde_json::Value {
    engine.execute(request.into().0).await.to_json()
}

/// `(code, path)` of every error of a serialized response.
pub fn error_codes(response: &serde_json::Value) -> Vec<(String, serde_json::Value)> {
    response["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|error| {
                    (
                        error["extensions"]["code"].as_str().unwrap_or_default().to_string(),
                        error.get("path").cloned().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct RequestInput(Request);

impl From<&str> for RequestInput {
    fn from(query: &str) -> Self {
        RequestInput(Request::new(query))
    }
}

impl From<Request> for RequestInput {
    fn from(request: Request) -> Self {
        RequestInput(request)
    }
}
