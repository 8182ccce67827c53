mod backlog;
mod completion;
mod diagnostics;
mod error;
mod statistics;
mod task;

use std::sync::Arc;

use futures::future::join_all;
use schema::Schema;
use tokio_util::sync::CancellationToken;

pub(crate) use backlog::TaskBacklog;
pub use diagnostics::{ExecutionDiagnostics, NoopDiagnostics};
pub use self::error::{ExecutionError, ExecutionResult};
pub(crate) use statistics::TaskStatistics;
pub(crate) use task::{ResolverTask, ResolverTaskDefinition};

use crate::{
    config::ExecutionConfig,
    operation::{CompiledOperation, Selection, Variables},
    pool::ObjectPool,
    resolver::{ParentValue, Resolvers, ScopedData},
    response::{BuiltResult, ResponsePath, ResultHelper, ResultPool},
};

/// Pieces shared by every request of an engine.
pub(crate) struct ExecutionEnvironment {
    pub schema: Arc<Schema>,
    pub resolvers: Arc<Resolvers>,
    pub diagnostics: Arc<dyn ExecutionDiagnostics>,
    pub result_pool: Arc<ResultPool>,
    pub task_pool: Arc<ObjectPool<Box<ResolverTask>>>,
    pub config: ExecutionConfig,
}

impl ExecutionEnvironment {
    pub fn new(
        schema: Arc<Schema>,
        resolvers: Arc<Resolvers>,
        diagnostics: Arc<dyn ExecutionDiagnostics>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            schema,
            resolvers,
            diagnostics,
            result_pool: Arc::new(ResultPool::new(&config.pool)),
            task_pool: Arc::new(ObjectPool::new(config.pool.max_idle_tasks, Box::<ResolverTask>::default)),
            config,
        }
    }
}

/// State of a single request, shared by its execution loops and resolver tasks.
pub(crate) struct ExecutionContext {
    pub schema: Arc<Schema>,
    pub operation: Arc<CompiledOperation>,
    pub resolvers: Arc<Resolvers>,
    pub variables: Arc<Variables>,
    pub result: ResultHelper,
    pub backlog: TaskBacklog,
    pub diagnostics: Arc<dyn ExecutionDiagnostics>,
    pub cancellation: CancellationToken,
    pub task_pool: Arc<ObjectPool<Box<ResolverTask>>>,
    pub allow_internal_selections: bool,
    pub workers: usize,
}

pub(crate) struct ExecutionRequest {
    pub operation: Arc<CompiledOperation>,
    /// Variables with their defaults applied.
    pub variables: Variables,
    pub root_value: ParentValue,
    pub data: ScopedData,
    pub cancellation: CancellationToken,
}

/// Runs a compiled operation until every task settled, the request got cancelled or the timeout
/// elapsed, and assembles whatever was resolved.
pub(crate) async fn execute(env: &ExecutionEnvironment, request: ExecutionRequest) -> ExecutionResult<BuiltResult> {
    let ExecutionRequest {
        operation,
        variables,
        root_value,
        data,
        cancellation,
    } = request;

    let Some(root_selection_set) = operation.root_selection_set().cloned() else {
        return Err(ExecutionError::invariant("Root selection set was not compiled"));
    };

    let ctx = Arc::new(ExecutionContext {
        schema: env.schema.clone(),
        operation,
        resolvers: env.resolvers.clone(),
        variables: Arc::new(variables),
        result: ResultHelper::new(env.result_pool.clone()),
        backlog: TaskBacklog::default(),
        diagnostics: env.diagnostics.clone(),
        // Cancelling on timeout must not affect the caller.
        cancellation: cancellation.child_token(),
        task_pool: env.task_pool.clone(),
        allow_internal_selections: env.config.allow_internal_selections,
        workers: env.config.workers.max(1),
    });

    let root = ctx.result.rent_result_map(root_selection_set.len(), None);
    let root_definition = |selection: &Arc<Selection>| ResolverTaskDefinition {
        selection: Arc::clone(selection),
        parent: root_value.clone(),
        target: root,
        parent_path: ResponsePath::root(),
        data: data.clone(),
    };

    let run = async {
        let roots = root_selection_set.included(&ctx.variables, ctx.allow_internal_selections);
        if ctx.operation.is_serial() {
            for selection in roots {
                ctx.backlog.register(&ctx, root_definition(selection));
                run_execution_loops(&ctx).await;
                if ctx.cancellation.is_cancelled() {
                    break;
                }
            }
        } else {
            for selection in roots {
                ctx.backlog.register(&ctx, root_definition(selection));
            }
            run_execution_loops(&ctx).await;
        }
    };

    match env.config.timeout {
        Some(timeout) => {
            if tokio::time::timeout(timeout, run).await.is_err() {
                tracing::debug!("Operation timed out after {timeout:?}");
                ctx.cancellation.cancel();
            }
        }
        None => run.await,
    }

    let discarded = ctx.backlog.discard_pending(&ctx.task_pool);
    if discarded > 0 {
        tracing::debug!("Discarded {discarded} pending tasks after cancellation");
    }

    ctx.result.build_result(root)
}

async fn run_execution_loops(ctx: &Arc<ExecutionContext>) {
    join_all((0..ctx.workers).map(|_| execution_loop(ctx))).await;
}

async fn execution_loop(ctx: &Arc<ExecutionContext>) {
    loop {
        while let Some(task) = ctx.backlog.try_take() {
            task.begin_execute();
        }
        if ctx.cancellation.is_cancelled() || ctx.backlog.statistics().is_completed() {
            break;
        }
        if !ctx.backlog.wait_for_task(&ctx.cancellation).await {
            break;
        }
    }
}
