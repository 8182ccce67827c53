use std::sync::Arc;

use async_graphql_parser::{
    parse_schema,
    types::{self as ast, DirectiveLocation, TypeSystemDefinition},
    Positioned,
};
use async_graphql_value::Name;
use fxhash::FxHashMap;
use indexmap::IndexMap;

use crate::{
    scalars::*, DirectiveDefinition, EnumType, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    ObjectType, Schema, SchemaError, TypeDefinition, TypeDefinitionKind, TypeRef, UnionType,
};

#[derive(Default)]
pub(crate) struct SchemaBuilder {
    query: Option<Name>,
    mutation: Option<Name>,
    subscription: Option<Name>,
    types: IndexMap<Name, TypeDefinition>,
    directives: FxHashMap<Name, DirectiveDefinition>,
    extensions: Vec<ast::TypeDefinition>,
}

impl SchemaBuilder {
    pub(crate) fn build(sdl: &str) -> Result<Schema, SchemaError> {
        let document = parse_schema(sdl)?;
        let mut builder = SchemaBuilder::default();
        builder.ingest_builtins();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(Positioned { node: schema, .. }) => {
                    builder.query = schema.query.map(|name| name.node).or(builder.query.take());
                    builder.mutation = schema.mutation.map(|name| name.node).or(builder.mutation.take());
                    builder.subscription = schema
                        .subscription
                        .map(|name| name.node)
                        .or(builder.subscription.take());
                }
                TypeSystemDefinition::Type(Positioned { node: definition, .. }) => {
                    if definition.extend {
                        builder.extensions.push(definition);
                    } else {
                        builder.ingest_type(definition)?;
                    }
                }
                TypeSystemDefinition::Directive(Positioned { node: directive, .. }) => {
                    builder.ingest_directive(directive);
                }
            }
        }

        for extension in std::mem::take(&mut builder.extensions) {
            builder.apply_extension(extension)?;
        }

        builder.finish()
    }

    fn ingest_builtins(&mut self) {
        for name in BUILTIN_SCALARS {
            let name = Name::new(name);
            self.types.insert(
                name.clone(),
                TypeDefinition {
                    name,
                    description: None,
                    kind: TypeDefinitionKind::Scalar,
                },
            );
        }

        for name in ["skip", "include"] {
            let name = Name::new(name);
            let condition = InputValueDefinition {
                name: Name::new("if"),
                ty: TypeRef::named("Boolean").non_null(),
                default_value: None,
            };
            self.directives.insert(
                name.clone(),
                DirectiveDefinition {
                    name,
                    arguments: [(condition.name.clone(), condition)].into_iter().collect(),
                    is_repeatable: false,
                    locations: vec![
                        DirectiveLocation::Field,
                        DirectiveLocation::FragmentSpread,
                        DirectiveLocation::InlineFragment,
                    ],
                },
            );
        }
    }

    fn ingest_type(&mut self, definition: ast::TypeDefinition) -> Result<(), SchemaError> {
        let name = definition.name.node.clone();
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }

        let kind = match definition.kind {
            ast::TypeKind::Scalar => TypeDefinitionKind::Scalar,
            ast::TypeKind::Object(object) => TypeDefinitionKind::Object(ObjectType {
                name: name.clone(),
                fields: convert_fields(object.fields),
                implements: object.implements.into_iter().map(|name| name.node).collect(),
            }),
            ast::TypeKind::Interface(interface) => TypeDefinitionKind::Interface(InterfaceType {
                fields: convert_fields(interface.fields),
                implements: interface.implements.into_iter().map(|name| name.node).collect(),
            }),
            ast::TypeKind::Union(union) => TypeDefinitionKind::Union(UnionType {
                members: union.members.into_iter().map(|name| name.node).collect(),
            }),
            ast::TypeKind::Enum(enum_type) => TypeDefinitionKind::Enum(EnumType {
                values: enum_type.values.into_iter().map(|value| value.node.value.node).collect(),
            }),
            ast::TypeKind::InputObject(input) => TypeDefinitionKind::InputObject(InputObjectType {
                fields: convert_input_values(input.fields),
            }),
        };

        self.types.insert(
            name.clone(),
            TypeDefinition {
                name,
                description: definition.description.map(|description| description.node),
                kind,
            },
        );
        Ok(())
    }

    fn ingest_directive(&mut self, directive: ast::DirectiveDefinition) {
        let name = directive.name.node;
        self.directives.insert(
            name.clone(),
            DirectiveDefinition {
                name,
                arguments: convert_input_values(directive.arguments),
                is_repeatable: directive.is_repeatable,
                locations: directive.locations.into_iter().map(|location| location.node).collect(),
            },
        );
    }

    fn apply_extension(&mut self, extension: ast::TypeDefinition) -> Result<(), SchemaError> {
        let name = extension.name.node;
        let Some(target) = self.types.get_mut(&name) else {
            return Err(SchemaError::UnknownExtendedType(name.to_string()));
        };

        match (&mut target.kind, extension.kind) {
            (TypeDefinitionKind::Object(object), ast::TypeKind::Object(extension)) => {
                object.fields.extend(convert_fields(extension.fields));
                object
                    .implements
                    .extend(extension.implements.into_iter().map(|name| name.node));
            }
            (TypeDefinitionKind::Interface(interface), ast::TypeKind::Interface(extension)) => {
                interface.fields.extend(convert_fields(extension.fields));
                interface
                    .implements
                    .extend(extension.implements.into_iter().map(|name| name.node));
            }
            (TypeDefinitionKind::Union(union), ast::TypeKind::Union(extension)) => {
                union.members.extend(extension.members.into_iter().map(|name| name.node));
            }
            (TypeDefinitionKind::Enum(values), ast::TypeKind::Enum(extension)) => {
                values
                    .values
                    .extend(extension.values.into_iter().map(|value| value.node.value.node));
            }
            (TypeDefinitionKind::InputObject(input), ast::TypeKind::InputObject(extension)) => {
                input.fields.extend(convert_input_values(extension.fields));
            }
            (TypeDefinitionKind::Scalar, ast::TypeKind::Scalar) => {}
            _ => return Err(SchemaError::ExtensionKindMismatch(name.to_string())),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Schema, SchemaError> {
        for (default, slot) in [
            ("Query", &mut self.query),
            ("Mutation", &mut self.mutation),
            ("Subscription", &mut self.subscription),
        ] {
            if slot.is_none() && self.types.contains_key(default) {
                *slot = Some(Name::new(default));
            }
        }

        for root in [&self.query, &self.mutation, &self.subscription].into_iter().flatten() {
            match self.types.get(root) {
                Some(definition) if definition.as_object().is_some() => {}
                Some(_) => return Err(SchemaError::RootTypeNotObject(root.to_string())),
                None => return Err(SchemaError::UnknownType(root.to_string())),
            }
        }

        self.validate_references()?;

        let mut possible_types: FxHashMap<Name, Vec<Name>> = FxHashMap::default();
        for definition in self.types.values() {
            match &definition.kind {
                TypeDefinitionKind::Object(object) => {
                    possible_types
                        .entry(definition.name.clone())
                        .or_default()
                        .push(definition.name.clone());
                    for interface in &object.implements {
                        possible_types
                            .entry(interface.clone())
                            .or_default()
                            .push(definition.name.clone());
                    }
                }
                TypeDefinitionKind::Union(union) => {
                    possible_types
                        .entry(definition.name.clone())
                        .or_default()
                        .extend(union.members.iter().cloned());
                }
                _ => {}
            }
        }

        let mut scalars: FxHashMap<Name, Arc<dyn ScalarSerializer>> = FxHashMap::default();
        scalars.insert(Name::new("Int"), Arc::new(IntScalar));
        scalars.insert(Name::new("Float"), Arc::new(FloatScalar));
        scalars.insert(Name::new("String"), Arc::new(StringScalar));
        scalars.insert(Name::new("Boolean"), Arc::new(BooleanScalar));
        scalars.insert(Name::new("ID"), Arc::new(IdScalar));

        Ok(Schema {
            query: self.query,
            mutation: self.mutation,
            subscription: self.subscription,
            types: self.types,
            directives: self.directives,
            possible_types,
            scalars,
            typename_field: FieldDefinition {
                name: Name::new("__typename"),
                ty: TypeRef::named("String").non_null(),
                arguments: IndexMap::new(),
                directives: Vec::new(),
            },
        })
    }

    fn validate_references(&self) -> Result<(), SchemaError> {
        let ensure_exists = |ty: &TypeRef| {
            let name = ty.named_type();
            if self.types.contains_key(name) {
                Ok(())
            } else {
                Err(SchemaError::UnknownType(name.to_string()))
            }
        };

        for definition in self.types.values() {
            if let Some(fields) = definition.fields() {
                for field in fields.values() {
                    ensure_exists(&field.ty)?;
                    for argument in field.arguments.values() {
                        ensure_exists(&argument.ty)?;
                    }
                }
            }
            match &definition.kind {
                TypeDefinitionKind::Union(union) => {
                    for member in &union.members {
                        match self.types.get(member) {
                            Some(member) if member.as_object().is_some() => {}
                            _ => return Err(SchemaError::InvalidUnionMember(member.to_string())),
                        }
                    }
                }
                TypeDefinitionKind::InputObject(input) => {
                    for field in input.fields.values() {
                        ensure_exists(&field.ty)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn convert_fields(fields: Vec<Positioned<ast::FieldDefinition>>) -> IndexMap<Name, FieldDefinition> {
    fields
        .into_iter()
        .map(|Positioned { node: field, .. }| {
            let name = field.name.node;
            let definition = FieldDefinition {
                name: name.clone(),
                ty: TypeRef::from(&field.ty.node),
                arguments: convert_input_values(field.arguments),
                directives: field.directives.into_iter().map(|directive| directive.node).collect(),
            };
            (name, definition)
        })
        .collect()
}

fn convert_input_values(values: Vec<Positioned<ast::InputValueDefinition>>) -> IndexMap<Name, InputValueDefinition> {
    values
        .into_iter()
        .map(|Positioned { node: value, .. }| {
            let name = value.name.node;
            let definition = InputValueDefinition {
                name: name.clone(),
                ty: TypeRef::from(&value.ty.node),
                default_value: value.default_value.map(|value| value.node),
            };
            (name, definition)
        })
        .collect()
}
