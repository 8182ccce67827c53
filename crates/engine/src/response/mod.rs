mod data;
mod helper;
mod path;
mod ser;
mod value;

use std::sync::Arc;

use error::GraphqlError;
use serde::ser::SerializeMap;

pub(crate) use data::*;
pub(crate) use helper::*;
pub use path::*;
pub(crate) use value::*;

/// Outcome of a request: the completed result tree, if any, plus errors.
///
/// The result tree stays in pooled memory until the response is dropped.
pub struct Response {
    data: ResponseData,
    errors: Vec<GraphqlError>,
}

enum ResponseData {
    /// The request failed before execution started, `data` is not part of the response.
    Absent,
    Null,
    Tree {
        memory: Arc<ResultMemoryOwner>,
        root: ResultMapId,
    },
}

impl Response {
    pub(crate) fn request_error(error: GraphqlError) -> Self {
        Self {
            data: ResponseData::Absent,
            errors: vec![error],
        }
    }

    pub(crate) fn request_errors(errors: Vec<GraphqlError>) -> Self {
        Self {
            data: ResponseData::Absent,
            errors,
        }
    }

    pub(crate) fn execution_failure(error: GraphqlError) -> Self {
        Self {
            data: ResponseData::Null,
            errors: vec![error],
        }
    }

    pub fn errors(&self) -> &[GraphqlError] {
        &self.errors
    }

    pub fn has_data(&self) -> bool {
        matches!(self.data, ResponseData::Tree { .. })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl From<BuiltResult> for Response {
    fn from(BuiltResult { data, errors, memory }: BuiltResult) -> Self {
        let data = match data {
            Some(root) => ResponseData::Tree { memory, root },
            None => ResponseData::Null,
        };
        Self { data, errors }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("has_data", &self.has_data())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl serde::Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match &self.data {
            ResponseData::Absent => {}
            ResponseData::Null => map.serialize_entry("data", &())?,
            ResponseData::Tree { memory, root } => {
                let arena = memory.read();
                map.serialize_entry(
                    "data",
                    &ser::SerializableResultMap {
                        arena: &arena,
                        id: *root,
                    },
                )?;
            }
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        map.end()
    }
}
