use std::sync::Arc;

use async_graphql_parser::{types::Field, Positioned};
use async_graphql_value::{ConstValue, Name, Value};
use error::Location;
use schema::{FieldDefinition, Schema};

use super::{coercion::rewrite_variables, error::to_location, Variables};

/// A directive applied to a field, either in the schema or in the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDirective {
    name: Name,
    arguments: Vec<(Name, Value)>,
    /// Position in the operation, none for schema directives.
    location: Option<Location>,
}

impl CompiledDirective {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn is_schema_directive(&self) -> bool {
        self.location.is_none()
    }

    /// Value of an argument with the request variables bound.
    pub fn argument(&self, name: &str, variables: &Variables) -> Option<ConstValue> {
        let (_, value) = self.arguments.iter().find(|(argument, _)| argument.as_str() == name)?;
        rewrite_variables(value, variables).into_owned().into_const()
    }

    pub fn argument_json(&self, name: &str, variables: &Variables) -> Option<serde_json::Value> {
        self.argument(name, variables)?.into_json().ok()
    }
}

/// Directives of a field: schema ones first, then those of every occurrence in document order.
///
/// A non-repeatable directive evicts any earlier application of the same directive.
/// `@skip` and `@include` are handled by inclusion conditions.
pub(crate) fn compile_directives(
    schema: &Schema,
    field: &FieldDefinition,
    nodes: &[&Positioned<Field>],
) -> Vec<Arc<CompiledDirective>> {
    let mut directives: Vec<Arc<CompiledDirective>> = Vec::new();

    let schema_directives = field.directives.iter().map(|directive| {
        CompiledDirective {
            name: directive.name.node.clone(),
            arguments: directive
                .arguments
                .iter()
                .map(|(name, value)| (name.node.clone(), value.node.clone().into_value()))
                .collect(),
            location: None,
        }
    });
    let query_directives = nodes
        .iter()
        .flat_map(|node| node.node.directives.iter())
        .filter(|directive| !matches!(directive.node.name.node.as_str(), "skip" | "include"))
        .map(|directive| CompiledDirective {
            name: directive.node.name.node.clone(),
            arguments: directive
                .node
                .arguments
                .iter()
                .map(|(name, value)| (name.node.clone(), value.node.clone()))
                .collect(),
            location: Some(to_location(directive.pos)),
        });

    for mut directive in schema_directives.chain(query_directives) {
        let definition = schema.directive(&directive.name);
        if let Some(definition) = definition {
            for (name, argument) in &definition.arguments {
                let is_provided = directive.arguments.iter().any(|(provided, _)| provided == name);
                if let (false, Some(default_value)) = (is_provided, &argument.default_value) {
                    directive.arguments.push((name.clone(), default_value.clone().into_value()));
                }
            }
        }
        if !definition.is_some_and(|definition| definition.is_repeatable) {
            directives.retain(|existing| existing.name != directive.name);
        }
        directives.push(Arc::new(directive));
    }

    directives
}
