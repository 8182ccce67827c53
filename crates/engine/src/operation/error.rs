use async_graphql_parser::{types::OperationType, Pos};
use error::{ErrorCode, GraphqlError, Location};

/// Fatal compilation failures. Should not happen for documents validated against the schema.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("{operation_type} root type is not defined on this schema")]
    MissingRootType { operation_type: OperationType },
    #[error("{container} does not have a field named '{name}'")]
    UnknownField { container: String, name: String, pos: Pos },
    #[error("Field '{name}' of type '{ty}' must have a selection of subfields")]
    MissingSelectionSet { name: String, ty: String, pos: Pos },
    #[error("Field '{name}' cannot have a selection set, it's a {ty}")]
    SelectionSetOnLeaf { name: String, ty: String, pos: Pos },
    #[error("Internal selection '{name}' on {container} must be a leaf field")]
    InternalSelectionNotLeaf { container: String, name: String },
}

impl CompileError {
    pub fn location(&self) -> Option<Location> {
        match self {
            CompileError::UnknownField { pos, .. }
            | CompileError::MissingSelectionSet { pos, .. }
            | CompileError::SelectionSetOnLeaf { pos, .. } => Some(to_location(*pos)),
            CompileError::MissingRootType { .. } | CompileError::InternalSelectionNotLeaf { .. } => None,
        }
    }
}

impl From<CompileError> for GraphqlError {
    fn from(err: CompileError) -> Self {
        let location = err.location();
        let error = GraphqlError::new(err.to_string(), ErrorCode::OperationPlanningError);
        match location {
            Some(location) => error.with_location(location),
            None => error,
        }
    }
}

pub(crate) fn to_location(Pos { line, column }: Pos) -> Location {
    Location { line, column }
}

/// Failure to coerce an input value against its declared type.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputValueError {
    #[error("Found a null where we expected a {expected}{path}")]
    UnexpectedNull { expected: String, path: ValuePath },
    #[error("{message}{path}")]
    InvalidLeaf { message: String, path: ValuePath },
    #[error("Found a {actual} value where we expected a '{expected}' input object{path}")]
    NotAnObject {
        expected: String,
        actual: &'static str,
        path: ValuePath,
    },
    #[error("Input object '{ty}' does not have a field named '{name}'{path}")]
    UnknownInputField { ty: String, name: String, path: ValuePath },
    #[error("Missing required field '{name}' of input object '{ty}'{path}")]
    MissingInputField { ty: String, name: String, path: ValuePath },
    #[error("Unknown input type '{0}'")]
    UnknownType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValuePathSegment {
    Field(String),
    Index(usize),
}

/// Position inside a nested input value, rendered as a message suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(pub(crate) Vec<ValuePathSegment>);

impl std::fmt::Display for ValuePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" at path '")?;
        for segment in &self.0 {
            match segment {
                ValuePathSegment::Field(name) => write!(f, ".{name}")?,
                ValuePathSegment::Index(index) => write!(f, ".{index}")?,
            }
        }
        f.write_str("'")
    }
}
