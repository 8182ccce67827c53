#![deny(clippy::future_not_send)]

mod config;
mod engine;
mod execution;
mod operation;
mod pool;
mod resolver;
mod response;

pub use config::{ExecutionConfig, OperationCacheConfig, PoolConfig};
pub use engine::{Engine, EngineBuilder, Request};
pub use error::{ErrorCode, GraphqlError};
pub use execution::{ExecutionDiagnostics, ExecutionError, NoopDiagnostics};
pub use operation::{
    ArgumentError, ArgumentValues, CompileError, CompiledDirective, CompiledOperation, ConditionValue,
    IncludeCondition, Inclusion, InputValueError, Next, PreparedArgument, PreparedArguments, Selection, SelectionId,
    SelectionSet, SelectionSetId, SelectionSetOptimizer, SelectionSetOptimizerContext, ValuePath,
    VariableDefinitionRecord, Variables,
};
pub use resolver::{
    DirectiveMiddleware, FieldContext, FieldError, FieldResolver, FieldValue, OpaqueValue, ParentValue,
    ResolverContext, Resolvers, ScopedData, TypeResolver, ValueConverter,
};
pub use response::{PathSegment, Response, ResponsePath};
pub use schema::Schema;
