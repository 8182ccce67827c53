//! Read-only GraphQL type system used by the execution engine.
//!
//! A [`Schema`] is built once from SDL and shared behind an `Arc` by every operation compiled
//! against it. Leaf serializers for custom scalars can be registered before sharing.

mod builder;
mod definitions;
mod scalars;
mod ty;

use std::sync::Arc;

pub use async_graphql_parser::types::OperationType;
use async_graphql_value::{ConstValue, Name};
use fxhash::FxHashMap;
use indexmap::IndexMap;

pub use definitions::*;
pub use scalars::ScalarSerializer;
pub use ty::TypeRef;

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error(transparent)]
    Parse(#[from] async_graphql_parser::Error),
    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("Unknown type '{0}'")]
    UnknownType(String),
    #[error("Cannot extend unknown type '{0}'")]
    UnknownExtendedType(String),
    #[error("Extension of '{0}' does not match the kind of the original definition")]
    ExtensionKindMismatch(String),
    #[error("Root operation type '{0}' must be an object type")]
    RootTypeNotObject(String),
    #[error("Union member '{0}' must be an object type")]
    InvalidUnionMember(String),
    #[error("Cannot register a serializer for '{0}', it is not a custom scalar")]
    NotACustomScalar(String),
}

pub struct Schema {
    query: Option<Name>,
    mutation: Option<Name>,
    subscription: Option<Name>,
    types: IndexMap<Name, TypeDefinition>,
    directives: FxHashMap<Name, DirectiveDefinition>,
    // object name -> itself, interface/union name -> member objects, in definition order.
    possible_types: FxHashMap<Name, Vec<Name>>,
    scalars: FxHashMap<Name, Arc<dyn ScalarSerializer>>,
    typename_field: FieldDefinition,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query", &self.query)
            .field("mutation", &self.mutation)
            .field("subscription", &self.subscription)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        builder::SchemaBuilder::build(sdl)
    }

    /// Registers the serializer used to complete and coerce values of a custom scalar.
    pub fn with_scalar(mut self, name: &str, serializer: impl ScalarSerializer) -> Result<Self, SchemaError> {
        match self.types.get(name) {
            Some(definition) if matches!(definition.kind, TypeDefinitionKind::Scalar) && !self.scalars.contains_key(name) => {
                self.scalars.insert(definition.name.clone(), Arc::new(serializer));
                Ok(self)
            }
            _ => Err(SchemaError::NotACustomScalar(name.to_string())),
        }
    }

    pub fn root_type(&self, operation_type: OperationType) -> Option<&ObjectType> {
        let name = match operation_type {
            OperationType::Query => self.query.as_ref(),
            OperationType::Mutation => self.mutation.as_ref(),
            OperationType::Subscription => self.subscription.as_ref(),
        }?;
        self.object(name)
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name).and_then(TypeDefinition::as_object)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Field lookup on an object or interface, `__typename` included for every composite type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        let definition = self.types.get(type_name)?;
        if field_name == "__typename" && definition.is_composite() {
            return Some(&self.typename_field);
        }
        definition.fields()?.get(field_name)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    /// Concrete object types a value of `name` may have at runtime.
    pub fn possible_types(&self, name: &str) -> &[Name] {
        self.possible_types.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_possible_type(&self, abstract_type: &str, object: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|candidate| candidate.as_str() == object)
    }

    pub fn is_composite(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(TypeDefinition::is_composite)
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(TypeDefinition::is_abstract)
    }

    pub fn is_leaf(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(TypeDefinition::is_leaf)
    }

    /// Serializes a leaf runtime value for the response.
    pub fn serialize_leaf(&self, type_name: &str, value: serde_json::Value) -> Result<serde_json::Value, String> {
        let Some(definition) = self.types.get(type_name) else {
            return Err(format!("Unknown leaf type '{type_name}'"));
        };
        match &definition.kind {
            TypeDefinitionKind::Enum(values) => match value {
                serde_json::Value::String(ref name) if values.contains(name) => Ok(value),
                other => Err(format!("Enum '{type_name}' cannot represent value: {other}")),
            },
            TypeDefinitionKind::Scalar => self.scalar(type_name).serialize(value),
            _ => Err(format!("'{type_name}' is not a leaf type")),
        }
    }

    /// Parses an input literal of a leaf type into its runtime value.
    pub fn parse_leaf_literal(&self, type_name: &str, value: &ConstValue) -> Result<serde_json::Value, String> {
        let Some(definition) = self.types.get(type_name) else {
            return Err(format!("Unknown leaf type '{type_name}'"));
        };
        match &definition.kind {
            TypeDefinitionKind::Enum(values) => match value {
                ConstValue::Enum(name) if values.contains(name) => Ok(serde_json::Value::String(name.to_string())),
                // Variables carry enum values as JSON strings.
                ConstValue::String(name) if values.contains(name) => Ok(serde_json::Value::String(name.clone())),
                other => Err(format!("Enum '{type_name}' cannot represent value: {other}")),
            },
            TypeDefinitionKind::Scalar => self.scalar(type_name).parse_literal(value),
            _ => Err(format!("'{type_name}' is not a leaf type")),
        }
    }

    fn scalar(&self, name: &str) -> &dyn ScalarSerializer {
        match self.scalars.get(name) {
            Some(serializer) => serializer.as_ref(),
            None => &scalars::PassthroughScalar,
        }
    }
}
