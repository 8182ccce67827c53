use std::{any::Any, borrow::Cow};

use tokio_util::sync::CancellationToken;

use crate::{
    operation::Variables,
    resolver::{ParentValue, ScopedData},
};

/// A GraphQL request, deserializable from the usual `query`, `operationName` and `variables`
/// body. Root value, scoped data and cancellation can only be set programmatically.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(skip)]
    pub root_value: ParentValue,
    #[serde(skip)]
    pub data: ScopedData,
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn root_value(mut self, value: ParentValue) -> Self {
        self.root_value = value;
        self
    }

    /// Data readable by every resolver of the request.
    #[must_use]
    pub fn data<T: Any + Send + Sync>(mut self, key: impl Into<Cow<'static, str>>, value: T) -> Self {
        self.data.insert(key, value);
        self
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
