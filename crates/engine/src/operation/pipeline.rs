use std::sync::Arc;

use futures::future::BoxFuture;

use super::CompiledDirective;
use crate::resolver::{DirectiveMiddleware, FieldContext, FieldResolver, Resolvers};

/// Resolver of a field wrapped by the middlewares of its directives, outermost first.
pub(crate) enum FieldPipeline {
    Resolver(Arc<dyn FieldResolver>),
    Directive {
        middleware: Arc<dyn DirectiveMiddleware>,
        directive: Arc<CompiledDirective>,
        next: Box<FieldPipeline>,
    },
}

impl FieldPipeline {
    /// Directives without a registered middleware don't take part in the pipeline.
    pub fn build(resolver: Arc<dyn FieldResolver>, directives: &[Arc<CompiledDirective>], resolvers: &Resolvers) -> Self {
        directives
            .iter()
            .rev()
            .fold(FieldPipeline::Resolver(resolver), |next, directive| {
                match resolvers.directive_middleware(directive.name()) {
                    Some(middleware) => FieldPipeline::Directive {
                        middleware,
                        directive: directive.clone(),
                        next: Box::new(next),
                    },
                    None => next,
                }
            })
    }

    pub fn run<'a>(&'a self, ctx: &'a mut FieldContext) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match self {
                FieldPipeline::Resolver(resolver) => {
                    let result = resolver.resolve(ctx).await;
                    ctx.set_result(result);
                }
                FieldPipeline::Directive {
                    middleware,
                    directive,
                    next,
                } => middleware.invoke(ctx, directive, Next { pipeline: next }).await,
            }
        })
    }

    #[cfg(test)]
    pub fn directive_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self;
        while let FieldPipeline::Directive { directive, next, .. } = current {
            names.push(directive.name());
            current = next;
        }
        names
    }
}

/// Remaining part of a field pipeline, given to directive middlewares.
pub struct Next<'a> {
    pipeline: &'a FieldPipeline,
}

impl Next<'_> {
    /// Runs the rest of the pipeline, unless the field already failed.
    pub async fn run(self, ctx: &mut FieldContext) {
        if ctx.has_error() {
            return;
        }
        self.pipeline.run(ctx).await;
    }
}
