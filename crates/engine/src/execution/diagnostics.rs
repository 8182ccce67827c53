use crate::{operation::Selection, response::ResponsePath};

/// Hooks invoked around every field resolution.
///
/// Called from the resolver tasks, concurrently, so implementations must not block.
pub trait ExecutionDiagnostics: Send + Sync + 'static {
    fn resolve_field_started(&self, _selection: &Selection, _path: &ResponsePath) {}

    fn resolve_field_finished(&self, _selection: &Selection, _path: &ResponsePath, _had_errors: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl ExecutionDiagnostics for NoopDiagnostics {}
