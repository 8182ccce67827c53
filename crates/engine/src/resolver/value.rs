use std::{any::Any, borrow::Cow, sync::Arc};

use async_graphql_value::Name;
use error::{ErrorCode, ErrorPath, GraphqlError, Location};

/// Raw value produced by a resolver, completed against the field type afterwards.
pub enum FieldValue {
    Null,
    Value(serde_json::Value),
    List(Vec<FieldValue>),
    /// Lazily produced list items.
    Iter(Box<dyn Iterator<Item = FieldValue> + Send>),
    Object(OpaqueValue),
    Error(FieldError),
    Errors(Vec<FieldError>),
}

impl FieldValue {
    pub fn value(value: impl Into<serde_json::Value>) -> Self {
        FieldValue::Value(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = FieldValue>) -> Self {
        FieldValue::List(items.into_iter().collect())
    }

    pub fn iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = FieldValue>,
        I::IntoIter: Send + 'static,
    {
        FieldValue::Iter(Box::new(items.into_iter()))
    }

    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        FieldValue::Object(OpaqueValue::new(value))
    }

    /// Attaches the concrete object type, used to complete abstract types.
    #[must_use]
    pub fn with_type(self, typename: impl AsRef<str>) -> Self {
        match self {
            FieldValue::Object(value) => FieldValue::Object(value.with_type(typename)),
            FieldValue::Value(serde_json::Value::Object(mut fields)) => {
                fields.insert(
                    "__typename".to_string(),
                    serde_json::Value::String(typename.as_ref().to_string()),
                );
                FieldValue::Value(serde_json::Value::Object(fields))
            }
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Value(serde_json::Value::Null))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FieldValue::Error(_) | FieldValue::Errors(_))
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<FieldError> for FieldValue {
    fn from(error: FieldError) -> Self {
        FieldValue::Error(error)
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
            FieldValue::Iter(_) => f.write_str("Iter(..)"),
            FieldValue::Object(value) => f.debug_tuple("Object").field(value).finish(),
            FieldValue::Error(error) => f.debug_tuple("Error").field(error).finish(),
            FieldValue::Errors(errors) => f.debug_tuple("Errors").field(errors).finish(),
        }
    }
}

/// An arbitrary Rust value, passed as parent to the resolvers of its fields.
#[derive(Clone)]
pub struct OpaqueValue {
    value: Arc<dyn Any + Send + Sync>,
    typename: Option<Name>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            typename: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, typename: impl AsRef<str>) -> Self {
        self.typename = Some(Name::new(typename));
        self
    }

    pub fn typename(&self) -> Option<&Name> {
        self.typename.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl std::fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("typename", &self.typename)
            .finish_non_exhaustive()
    }
}

/// Value of the object whose fields are being resolved.
#[derive(Clone, Debug, Default)]
pub enum ParentValue {
    #[default]
    Null,
    Json(Arc<serde_json::Value>),
    Opaque(OpaqueValue),
}

impl ParentValue {
    pub fn json(value: serde_json::Value) -> Self {
        ParentValue::Json(Arc::new(value))
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ParentValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ParentValue::Opaque(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Concrete type carried by the value itself, `__typename` key or attached type.
    pub fn typename(&self) -> Option<&str> {
        match self {
            ParentValue::Null => None,
            ParentValue::Json(value) => value.get("__typename").and_then(serde_json::Value::as_str),
            ParentValue::Opaque(value) => value.typename().map(Name::as_str),
        }
    }
}

/// Error raised by a resolver, reported at the path of its field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    message: Cow<'static, str>,
    extensions: Vec<(Cow<'static, str>, serde_json::Value)>,
}

impl FieldError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions.push((key.into(), value.into()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn into_graphql_error(self, path: impl Into<ErrorPath>, locations: Vec<Location>) -> GraphqlError {
        GraphqlError::new(self.message, ErrorCode::ResolverError)
            .with_path(path)
            .with_locations(locations)
            .with_extensions(self.extensions)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&'static str> for FieldError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}
