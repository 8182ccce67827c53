use std::{panic::AssertUnwindSafe, sync::Arc};

use error::{ErrorCode, GraphqlError};
use futures::FutureExt;

use super::{completion::ValueCompleter, ExecutionContext};
use crate::{
    operation::Selection,
    pool::Reset,
    resolver::{FieldContext, FieldValue, ParentValue, ScopedData},
    response::{NonNullViolation, ParentLink, ResponsePath, ResultMapId, ResultParent, ResultValue},
};

/// What a resolver task resolves and where its value goes.
pub(crate) struct ResolverTaskDefinition {
    pub selection: Arc<Selection>,
    pub parent: ParentValue,
    /// Object receiving the value, at the response index of the selection.
    pub target: ResultMapId,
    /// Path of the target object.
    pub parent_path: ResponsePath,
    pub data: ScopedData,
}

/// Unit of work resolving and completing a single field. Pooled and reused across requests.
#[derive(Default)]
pub(crate) struct ResolverTask {
    context: Option<Arc<ExecutionContext>>,
    selection: Option<Arc<Selection>>,
    parent: ParentValue,
    target: Option<ResultMapId>,
    path: ResponsePath,
    data: ScopedData,
}

impl Reset for ResolverTask {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl ResolverTask {
    pub fn initialize(&mut self, ctx: Arc<ExecutionContext>, definition: ResolverTaskDefinition) {
        let ResolverTaskDefinition {
            selection,
            parent,
            target,
            parent_path,
            data,
        } = definition;
        self.path = parent_path.field(selection.response_name());
        self.context = Some(ctx);
        self.selection = Some(selection);
        self.parent = parent;
        self.target = Some(target);
        self.data = data;
    }

    #[cfg(test)]
    pub fn is_pristine(&self) -> bool {
        self.context.is_none()
            && self.selection.is_none()
            && matches!(self.parent, ParentValue::Null)
            && self.target.is_none()
            && self.path.is_root()
            && self.data.is_empty()
    }

    /// Starts the task in the background, the execution loop never waits for it.
    pub fn begin_execute(self: Box<Self>) {
        let Some(ctx) = self.context.as_ref() else {
            return;
        };
        ctx.backlog.statistics().task_started();
        tokio::spawn(self.execute());
    }

    async fn execute(mut self: Box<Self>) {
        let Some(ctx) = self.context.take() else {
            return;
        };

        if let (Some(selection), Some(target)) = (self.selection.take(), self.target) {
            if !ctx.cancellation.is_cancelled() {
                let parent = std::mem::take(&mut self.parent);
                let path = std::mem::take(&mut self.path);
                let data = std::mem::take(&mut self.data);
                resolve_field(&ctx, selection, parent, target, path, data).await;
            }
        }

        ctx.task_pool.release(self);
        ctx.backlog.statistics().task_completed();
    }
}

async fn resolve_field(
    ctx: &Arc<ExecutionContext>,
    selection: Arc<Selection>,
    parent: ParentValue,
    target: ResultMapId,
    path: ResponsePath,
    data: ScopedData,
) {
    ctx.diagnostics.resolve_field_started(&selection, &path);

    let mut had_errors = false;
    let mut child_data = None;
    let value = match selection.arguments().coerce(&ctx.schema, &ctx.variables) {
        Err(errors) => {
            had_errors = true;
            ctx.result.add_errors(errors.into_iter().map(|error| {
                GraphqlError::new(error.to_string(), ErrorCode::InvalidArgument)
                    .with_path(&path)
                    .with_locations(selection.locations())
            }));
            FieldValue::Null
        }
        Ok(arguments) => {
            let mut field = FieldContext {
                selection: selection.clone(),
                parent,
                arguments,
                path: path.clone(),
                variables: ctx.variables.clone(),
                data: data.clone(),
                child_data: None,
                result: None,
                cancellation: ctx.cancellation.clone(),
            };
            let outcome = AssertUnwindSafe(selection.pipeline().run(&mut field))
                .catch_unwind()
                .await;
            child_data = field.child_data.take();

            match (outcome, field.take_result()) {
                (Err(_), _) => {
                    tracing::warn!(
                        "Resolver of {}.{} panicked at {path}",
                        selection.declaring_type(),
                        selection.field_name()
                    );
                    had_errors = true;
                    ctx.result.add_error(
                        GraphqlError::internal_server_error()
                            .with_path(&path)
                            .with_locations(selection.locations()),
                    );
                    FieldValue::Null
                }
                (Ok(()), Some(Ok(value))) => {
                    had_errors = value.is_error();
                    value
                }
                (Ok(()), Some(Err(error))) => {
                    had_errors = true;
                    ctx.result
                        .add_error(error.into_graphql_error(&path, selection.locations()));
                    FieldValue::Null
                }
                // A middleware returned without running the rest of the pipeline.
                (Ok(()), None) => FieldValue::Null,
            }
        }
    };

    let link = ParentLink::new(ResultParent::Map(target), selection.response_index());
    let completer = ValueCompleter::new(ctx, &selection, &path, child_data.as_ref().unwrap_or(&data));
    match completer.complete_field(value, link) {
        Ok(value) => {
            ctx.result.set_value(
                target,
                selection.response_index(),
                selection.response_name(),
                value,
                selection.ty().is_nullable(),
            );
        }
        Err(_) => {
            ctx.result.set_value(
                target,
                selection.response_index(),
                selection.response_name(),
                ResultValue::Null,
                false,
            );
            ctx.result.add_non_null_violation(NonNullViolation {
                path: path.clone(),
                link,
            });
        }
    }

    ctx.diagnostics.resolve_field_finished(&selection, &path, had_errors);
}
