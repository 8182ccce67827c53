use std::borrow::Cow;

use error::{ErrorCode, GraphqlError};

#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    /// A bug in the engine rather than a problem with the request.
    #[error("Engine invariant violated: {0}")]
    Invariant(Cow<'static, str>),
    #[error("{0}")]
    Graphql(GraphqlError),
}

impl ExecutionError {
    pub fn invariant(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Invariant(message.into())
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

impl From<ExecutionError> for GraphqlError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Graphql(err) => err,
            // Details stay in the logs.
            ExecutionError::Invariant(_) => GraphqlError::new("Internal server error", ErrorCode::InternalServerError),
        }
    }
}

impl From<GraphqlError> for ExecutionError {
    fn from(err: GraphqlError) -> Self {
        ExecutionError::Graphql(err)
    }
}
