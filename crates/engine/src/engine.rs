mod builder;
mod cache;
mod request;

use std::sync::Arc;

use async_graphql_parser::{
    types::{DocumentOperations, ExecutableDocument, OperationDefinition},
    Positioned,
};
use async_graphql_value::Name;
use error::{ErrorCode, GraphqlError};
use schema::Schema;
use tracing::Instrument as _;

pub use builder::EngineBuilder;
pub use request::Request;

use crate::{
    config::ExecutionConfig,
    execution::{self, ExecutionEnvironment, ExecutionRequest},
    operation::{bind_variables, compile, CompiledOperation, SelectionSetOptimizer},
    response::Response,
};

/// Entry point: compiles operations against a schema and executes them with the registered
/// resolvers.
pub struct Engine {
    env: ExecutionEnvironment,
    optimizers: Vec<Arc<dyn SelectionSetOptimizer>>,
    operation_cache: Option<quick_cache::sync::Cache<String, Arc<CompiledOperation>>>,
}

impl Engine {
    pub fn builder(schema: Arc<Schema>) -> EngineBuilder {
        EngineBuilder::new(schema)
    }

    pub fn schema(&self) -> &Schema {
        &self.env.schema
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.env.config
    }

    pub async fn execute(&self, request: Request) -> Response {
        let Request {
            query,
            operation_name,
            variables,
            root_value,
            data,
            cancellation,
        } = request;

        let operation = match self.prepare(&query, operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(err) => return Response::request_error(err),
        };

        let variables = match bind_variables(operation.variable_definitions(), variables) {
            Ok(variables) => variables,
            Err(errors) => return Response::request_errors(errors),
        };

        let span = tracing::info_span!(
            "execute_operation",
            "operation.name" = operation.name().unwrap_or_default(),
            "operation.type" = %operation.ty(),
        );
        let request = ExecutionRequest {
            operation,
            variables,
            root_value,
            data,
            cancellation: cancellation.unwrap_or_default(),
        };

        match execution::execute(&self.env, request).instrument(span).await {
            Ok(result) => Response::from(result),
            Err(err) => {
                tracing::error!("Execution failed: {err}");
                Response::execution_failure(err.into())
            }
        }
    }

    /// Parses and compiles an operation, or retrieves it from the operation cache.
    pub fn prepare(&self, query: &str, operation_name: Option<&str>) -> Result<Arc<CompiledOperation>, GraphqlError> {
        let cache_key = cache::Key::Operation {
            name: operation_name,
            document: query,
        }
        .to_string();

        if let Some(operation) = self.operation_cache.as_ref().and_then(|cache| cache.get(&cache_key)) {
            tracing::debug!("Operation cache hit");
            return Ok(operation);
        }

        let document = async_graphql_parser::parse_query(query)
            .map_err(|err| GraphqlError::new(err.to_string(), ErrorCode::OperationParsingError))?;
        let (name, operation) = select_operation(&document, operation_name)?;
        let operation = Arc::new(compile(
            &self.env.schema,
            &self.env.resolvers,
            &document.fragments,
            name,
            operation,
            &self.optimizers,
        )?);
        tracing::debug!(
            "Compiled operation into {} selections",
            operation.selection_count()
        );

        if let Some(cache) = &self.operation_cache {
            cache.insert(cache_key, operation.clone());
        }
        Ok(operation)
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<(Option<&'a Name>, &'a Positioned<OperationDefinition>), GraphqlError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok((None, operation)),
        (DocumentOperations::Multiple(operations), Some(operation_name)) => operations
            .get_key_value(operation_name)
            .map(|(name, operation)| (Some(name), operation))
            .ok_or_else(|| unknown_operation(operation_name)),
        (DocumentOperations::Multiple(operations), None) => {
            let mut operations = operations.iter();
            match (operations.next(), operations.next()) {
                (Some((name, operation)), None) => Ok((Some(name), operation)),
                _ => Err(GraphqlError::new(
                    "Operation name is required when the document contains multiple operations",
                    ErrorCode::OperationParsingError,
                )),
            }
        }
        (DocumentOperations::Single(_), Some(operation_name)) => Err(unknown_operation(operation_name)),
    }
}

fn unknown_operation(name: &str) -> GraphqlError {
    GraphqlError::new(
        format!("Unknown operation named '{name}'"),
        ErrorCode::OperationParsingError,
    )
}
