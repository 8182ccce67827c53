use std::{any::Any, borrow::Cow, sync::Arc};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::{FieldError, FieldValue, ParentValue};
use crate::{
    operation::{ArgumentValues, Selection, Variables},
    response::ResponsePath,
};

/// Immutable key-value data visible to a field and everything below it.
///
/// Cloning is cheap, values are structurally shared.
#[derive(Clone, Default)]
pub struct ScopedData(im::HashMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>);

impl ScopedData {
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.0.get(key).and_then(|value| value.clone().downcast::<T>().ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<Cow<'static, str>>, value: T) {
        self.0.insert(key.into(), Arc::new(value));
    }

    #[must_use]
    pub fn with<T: Any + Send + Sync>(&self, key: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self(self.0.update(key.into(), Arc::new(value)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ScopedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Mutable state of a single field resolution, shared by the directive middlewares and the
/// resolver of the field.
pub struct FieldContext {
    pub(crate) selection: Arc<Selection>,
    pub(crate) parent: ParentValue,
    pub(crate) arguments: ArgumentValues,
    pub(crate) path: ResponsePath,
    pub(crate) variables: Arc<Variables>,
    pub(crate) data: ScopedData,
    pub(crate) child_data: Option<ScopedData>,
    pub(crate) result: Option<Result<FieldValue, FieldError>>,
    pub(crate) cancellation: CancellationToken,
}

impl FieldContext {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn parent(&self) -> &ParentValue {
        &self.parent
    }

    pub fn arguments(&self) -> &ArgumentValues {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments.get(name)
    }

    pub fn argument_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, FieldError> {
        deserialize_argument(&self.arguments, name)
    }

    pub fn path(&self) -> &ResponsePath {
        &self.path
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn data<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.data.get(key)
    }

    /// Adds data visible to the fields selected below this one, not to its siblings.
    pub fn set_child_data<T: Any + Send + Sync>(&mut self, key: impl Into<Cow<'static, str>>, value: T) {
        let data = self.child_data.get_or_insert_with(|| self.data.clone());
        data.insert(key, value);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn result(&self) -> Option<&Result<FieldValue, FieldError>> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Result<FieldValue, FieldError>) {
        self.result = Some(result);
    }

    pub fn take_result(&mut self) -> Option<Result<FieldValue, FieldError>> {
        self.result.take()
    }

    /// Whether the field already failed, in which case remaining middlewares are skipped.
    pub fn has_error(&self) -> bool {
        match &self.result {
            Some(Err(_)) => true,
            Some(Ok(value)) => value.is_error(),
            None => false,
        }
    }

    /// Owned snapshot of the context, for resolvers that outlive the borrow.
    pub fn resolver_context(&self) -> ResolverContext {
        ResolverContext {
            selection: self.selection.clone(),
            parent: self.parent.clone(),
            arguments: self.arguments.clone(),
            path: self.path.clone(),
            variables: self.variables.clone(),
            data: self.data.clone(),
        }
    }
}

/// Owned view of a field resolution, given to closure resolvers.
#[derive(Clone)]
pub struct ResolverContext {
    selection: Arc<Selection>,
    pub parent: ParentValue,
    pub arguments: ArgumentValues,
    pub path: ResponsePath,
    pub variables: Arc<Variables>,
    pub data: ScopedData,
}

impl ResolverContext {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments.get(name)
    }

    pub fn argument_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, FieldError> {
        deserialize_argument(&self.arguments, name)
    }

    pub fn data<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.data.get(key)
    }
}

fn deserialize_argument<T: DeserializeOwned>(arguments: &ArgumentValues, name: &str) -> Result<Option<T>, FieldError> {
    match arguments.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|err| FieldError::new(format!("Invalid argument '{name}': {err}"))),
    }
}
