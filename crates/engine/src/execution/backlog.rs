use std::sync::Arc;

use crossbeam_queue::SegQueue;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::{ExecutionContext, ResolverTask, ResolverTaskDefinition, TaskStatistics};
use crate::pool::ObjectPool;

/// Unordered queue of the tasks of a request waiting for an execution loop.
#[derive(Default)]
pub(crate) struct TaskBacklog {
    queue: SegQueue<Box<ResolverTask>>,
    task_available: Notify,
    statistics: TaskStatistics,
}

impl TaskBacklog {
    pub fn statistics(&self) -> &TaskStatistics {
        &self.statistics
    }

    /// Nothing is registered anymore once the request is cancelled.
    pub fn register(&self, ctx: &Arc<ExecutionContext>, definition: ResolverTaskDefinition) {
        if ctx.cancellation.is_cancelled() {
            return;
        }
        tracing::trace!(
            "Scheduling {}.{}",
            definition.selection.declaring_type(),
            definition.selection.response_name()
        );
        let mut task = ctx.task_pool.rent();
        task.initialize(ctx.clone(), definition);
        self.statistics.task_created();
        self.queue.push(task);
        self.task_available.notify_waiters();
    }

    pub fn try_take(&self) -> Option<Box<ResolverTask>> {
        self.queue.pop()
    }

    /// Suspends until a task is available. Returns `false` if every task completed or the
    /// request was cancelled in the meantime.
    pub async fn wait_for_task(&self, cancellation: &CancellationToken) -> bool {
        loop {
            let task_available = self.task_available.notified();
            let state_changed = self.statistics.state_changed().notified();
            tokio::pin!(task_available, state_changed);
            // Registered before checking, so no notification falls in between.
            task_available.as_mut().enable();
            state_changed.as_mut().enable();

            if !self.queue.is_empty() {
                return true;
            }
            if self.statistics.is_completed() {
                return false;
            }

            tokio::select! {
                () = cancellation.cancelled() => return false,
                () = &mut task_available => return true,
                () = &mut state_changed => {}
            }
        }
    }

    /// Hands back the tasks that will never run, after the execution loops stopped.
    pub fn discard_pending(&self, pool: &ObjectPool<Box<ResolverTask>>) -> usize {
        let mut discarded = 0;
        while let Some(task) = self.queue.pop() {
            pool.release(task);
            self.statistics.task_discarded();
            discarded += 1;
        }
        discarded
    }
}
