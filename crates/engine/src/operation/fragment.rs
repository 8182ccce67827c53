use std::collections::HashMap;

use async_graphql_parser::{
    types::{Directive, FragmentDefinition, InlineFragment, SelectionSet},
    Pos, Positioned,
};
use async_graphql_value::Name;
use fxhash::FxHashMap;
use schema::Schema;

/// A fragment whose type condition exists in the schema.
#[derive(Clone)]
pub(crate) struct FragmentInfo<'doc> {
    pub type_condition: Name,
    pub directives: &'doc [Positioned<Directive>],
    pub selection_set: &'doc Positioned<SelectionSet>,
}

impl FragmentInfo<'_> {
    /// Whether the fragment applies to values of the concrete object type.
    pub fn applies_to(&self, schema: &Schema, object: &str) -> bool {
        schema.is_possible_type(&self.type_condition, object)
    }
}

/// Resolves fragment references of one document.
///
/// Named fragments are cached by name. Inline fragments are cached by node and parent type,
/// the same node being visited once per possible type of a polymorphic selection set.
pub(crate) struct FragmentResolver<'doc> {
    schema: &'doc Schema,
    fragments: &'doc HashMap<Name, Positioned<FragmentDefinition>>,
    named: FxHashMap<&'doc str, Option<FragmentInfo<'doc>>>,
    inline: FxHashMap<(Pos, Name), Option<FragmentInfo<'doc>>>,
}

impl<'doc> FragmentResolver<'doc> {
    pub fn new(schema: &'doc Schema, fragments: &'doc HashMap<Name, Positioned<FragmentDefinition>>) -> Self {
        Self {
            schema,
            fragments,
            named: FxHashMap::default(),
            inline: FxHashMap::default(),
        }
    }

    pub fn resolve_named(&mut self, name: &'doc str) -> Option<FragmentInfo<'doc>> {
        let schema = self.schema;
        let fragments = self.fragments;
        self.named
            .entry(name)
            .or_insert_with(|| {
                let fragment = fragments.get(name)?;
                let type_condition = &fragment.node.type_condition.node.on.node;
                schema.type_definition(type_condition)?;
                Some(FragmentInfo {
                    type_condition: type_condition.clone(),
                    directives: &fragment.node.directives,
                    selection_set: &fragment.node.selection_set,
                })
            })
            .clone()
    }

    /// A fragment without type condition takes the type of its parent.
    pub fn resolve_inline(
        &mut self,
        parent_type: &Name,
        Positioned { pos, node }: &'doc Positioned<InlineFragment>,
    ) -> Option<FragmentInfo<'doc>> {
        let schema = self.schema;
        self.inline
            .entry((*pos, parent_type.clone()))
            .or_insert_with(|| {
                let type_condition = match &node.type_condition {
                    Some(condition) => &condition.node.on.node,
                    None => parent_type,
                };
                schema.type_definition(type_condition)?;
                Some(FragmentInfo {
                    type_condition: type_condition.clone(),
                    directives: &node.directives,
                    selection_set: &node.selection_set,
                })
            })
            .clone()
    }
}
