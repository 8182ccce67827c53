use async_graphql_parser::types::{ConstDirective, DirectiveLocation};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::TypeRef;

#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub kind: TypeDefinitionKind,
}

#[derive(Debug, Clone)]
pub enum TypeDefinitionKind {
    Scalar,
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDefinition {
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            TypeDefinitionKind::Object(_) | TypeDefinitionKind::Interface(_) | TypeDefinitionKind::Union(_)
        )
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeDefinitionKind::Interface(_) | TypeDefinitionKind::Union(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TypeDefinitionKind::Scalar | TypeDefinitionKind::Enum(_))
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TypeDefinitionKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match &self.kind {
            TypeDefinitionKind::InputObject(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.kind {
            TypeDefinitionKind::Enum(values) => Some(values),
            _ => None,
        }
    }

    /// Fields of an object or interface.
    pub fn fields(&self) -> Option<&IndexMap<Name, FieldDefinition>> {
        match &self.kind {
            TypeDefinitionKind::Object(object) => Some(&object.fields),
            TypeDefinitionKind::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, FieldDefinition>,
    pub implements: Vec<Name>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceType {
    pub fields: IndexMap<Name, FieldDefinition>,
    pub implements: Vec<Name>,
}

#[derive(Debug, Clone, Default)]
pub struct UnionType {
    pub members: Vec<Name>,
}

#[derive(Debug, Clone, Default)]
pub struct EnumType {
    pub values: Vec<Name>,
}

impl EnumType {
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|candidate| candidate.as_str() == value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputObjectType {
    pub fields: IndexMap<Name, InputValueDefinition>,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: Name,
    pub ty: TypeRef,
    pub arguments: IndexMap<Name, InputValueDefinition>,
    /// Directives applied in the SDL, in declaration order.
    pub directives: Vec<ConstDirective>,
}

impl FieldDefinition {
    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub name: Name,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: Name,
    pub arguments: IndexMap<Name, InputValueDefinition>,
    pub is_repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

impl DirectiveDefinition {
    pub fn is_executable(&self) -> bool {
        self.locations.iter().any(|location| {
            matches!(
                location,
                DirectiveLocation::Field
                    | DirectiveLocation::FragmentSpread
                    | DirectiveLocation::InlineFragment
                    | DirectiveLocation::FieldDefinition
            )
        })
    }
}
