use std::sync::Arc;

use schema::Schema;

use super::Engine;
use crate::{
    config::ExecutionConfig,
    execution::{ExecutionDiagnostics, ExecutionEnvironment, NoopDiagnostics},
    operation::SelectionSetOptimizer,
    resolver::Resolvers,
};

pub struct EngineBuilder {
    schema: Arc<Schema>,
    resolvers: Resolvers,
    config: ExecutionConfig,
    optimizers: Vec<Arc<dyn SelectionSetOptimizer>>,
    diagnostics: Arc<dyn ExecutionDiagnostics>,
}

impl EngineBuilder {
    pub(super) fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            resolvers: Resolvers::default(),
            config: ExecutionConfig::default(),
            optimizers: Vec::new(),
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    #[must_use]
    pub fn resolvers(mut self, resolvers: Resolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    #[must_use]
    pub fn config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an optimizer applied to every selection set of every operation.
    #[must_use]
    pub fn optimizer(mut self, optimizer: impl SelectionSetOptimizer) -> Self {
        self.optimizers.push(Arc::new(optimizer));
        self
    }

    #[must_use]
    pub fn diagnostics(mut self, diagnostics: impl ExecutionDiagnostics) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    pub fn build(self) -> Engine {
        let Self {
            schema,
            resolvers,
            config,
            optimizers,
            diagnostics,
        } = self;

        let operation_cache = config
            .operation_cache
            .enabled
            .then(|| quick_cache::sync::Cache::new(config.operation_cache.limit.max(1)));

        Engine {
            env: ExecutionEnvironment::new(schema, Arc::new(resolvers), diagnostics, config),
            optimizers,
            operation_cache,
        }
    }
}
