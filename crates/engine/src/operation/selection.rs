use std::sync::Arc;

use async_graphql_parser::{types::Field, Pos, Positioned};
use async_graphql_value::Name;
use error::Location;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use schema::{FieldDefinition, TypeRef};

use super::{
    condition::{IncludeCondition, Inclusion, InclusionBuilder},
    error::to_location,
    CompiledDirective, FieldPipeline, PreparedArguments, Variables,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionSetId(pub(super) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(pub(super) u32);

impl SelectionSetId {
    pub(super) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field of a selection set for one concrete object type, all occurrences merged.
pub struct Selection {
    pub(super) id: SelectionId,
    pub(super) response_name: Name,
    pub(super) response_index: usize,
    pub(super) declaring_type: Name,
    pub(super) field: FieldDefinition,
    pub(super) nodes: Vec<Pos>,
    pub(super) pipeline: FieldPipeline,
    pub(super) arguments: PreparedArguments,
    pub(super) directives: Vec<Arc<CompiledDirective>>,
    pub(super) inclusion: Inclusion,
    pub(super) is_internal: bool,
    pub(super) annotations: IndexMap<Name, serde_json::Value>,
    pub(super) selection_set: Option<SelectionSetId>,
}

impl Selection {
    pub fn id(&self) -> SelectionId {
        self.id
    }

    /// Alias if any, field name otherwise.
    pub fn response_name(&self) -> &Name {
        &self.response_name
    }

    /// Slot of the field in its parent object.
    pub fn response_index(&self) -> usize {
        self.response_index
    }

    /// Concrete object type the field is resolved on.
    pub fn declaring_type(&self) -> &Name {
        &self.declaring_type
    }

    pub fn field(&self) -> &FieldDefinition {
        &self.field
    }

    pub fn field_name(&self) -> &Name {
        &self.field.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.field.ty
    }

    /// Position of every merged occurrence in the document.
    pub fn nodes(&self) -> &[Pos] {
        &self.nodes
    }

    pub fn locations(&self) -> Vec<Location> {
        self.nodes.iter().copied().map(to_location).collect()
    }

    pub(crate) fn pipeline(&self) -> &FieldPipeline {
        &self.pipeline
    }

    pub fn arguments(&self) -> &PreparedArguments {
        &self.arguments
    }

    /// Directives of the pipeline, outermost first.
    pub fn directives(&self) -> &[Arc<CompiledDirective>] {
        &self.directives
    }

    pub fn inclusion(&self) -> &Inclusion {
        &self.inclusion
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    pub fn annotation(&self, key: &str) -> Option<&serde_json::Value> {
        self.annotations.get(key)
    }

    /// Selection set applied to the value of this field, for composite fields.
    pub fn selection_set(&self) -> Option<SelectionSetId> {
        self.selection_set
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("id", &self.id)
            .field("response_name", &self.response_name)
            .field("response_index", &self.response_index)
            .field("declaring_type", &self.declaring_type)
            .field("field", &self.field.name)
            .field("nodes", &self.nodes.len())
            .field("inclusion", &self.inclusion)
            .field("is_internal", &self.is_internal)
            .finish_non_exhaustive()
    }
}

/// Selections applicable to one concrete object type, in response index order.
#[derive(Debug)]
pub struct SelectionSet {
    pub(super) selections: Vec<Arc<Selection>>,
    pub(super) is_conditional: bool,
}

impl SelectionSet {
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<Selection>> {
        self.selections.iter()
    }

    pub fn get(&self, response_name: &str) -> Option<&Arc<Selection>> {
        self.selections
            .iter()
            .find(|selection| selection.response_name.as_str() == response_name)
    }

    /// Whether selections must be filtered for each request before scheduling.
    pub fn is_conditional(&self) -> bool {
        self.is_conditional
    }

    /// Selections to schedule for a request.
    pub fn included<'a>(
        &'a self,
        variables: &'a Variables,
        allow_internal_selections: bool,
    ) -> impl Iterator<Item = &'a Arc<Selection>> + 'a {
        let is_conditional = self.is_conditional;
        self.selections.iter().filter(move |selection| {
            !is_conditional
                || ((!selection.is_internal || allow_internal_selections) && selection.inclusion.is_included(variables))
        })
    }
}

/// Compiled selection sets of one selection set node, by concrete type.
///
/// Most selection sets apply to one or two types, those are kept inline.
#[derive(Default)]
pub(crate) struct SelectionVariants {
    first: Option<(Name, Arc<SelectionSet>)>,
    second: Option<(Name, Arc<SelectionSet>)>,
    others: FxHashMap<Name, Arc<SelectionSet>>,
}

impl SelectionVariants {
    pub fn get(&self, type_name: &str) -> Option<&Arc<SelectionSet>> {
        match (&self.first, &self.second) {
            (Some((name, selections)), _) if name.as_str() == type_name => Some(selections),
            (_, Some((name, selections))) if name.as_str() == type_name => Some(selections),
            _ => self.others.get(type_name),
        }
    }

    pub fn insert(&mut self, type_name: Name, selections: Arc<SelectionSet>) {
        if self.first.is_none() {
            self.first = Some((type_name, selections));
        } else if self.second.is_none() {
            self.second = Some((type_name, selections));
        } else {
            self.others.insert(type_name, selections);
        }
    }

    pub fn len(&self) -> usize {
        usize::from(self.first.is_some()) + usize::from(self.second.is_some()) + self.others.len()
    }
}

/// Mutable field of a selection set while it is being compiled.
pub(crate) struct SelectionBuilder<'doc> {
    pub response_name: Name,
    pub field: FieldDefinition,
    pub nodes: Vec<&'doc Positioned<Field>>,
    /// Condition of each occurrence in `nodes`, inherited by its own sub-selections.
    pub node_conditions: Vec<Option<Arc<IncludeCondition>>>,
    pub inclusion: InclusionBuilder,
    pub is_internal: bool,
    pub annotations: IndexMap<Name, serde_json::Value>,
}

impl<'doc> SelectionBuilder<'doc> {
    pub fn new(response_name: Name, field: FieldDefinition) -> Self {
        Self {
            response_name,
            field,
            nodes: Vec::new(),
            node_conditions: Vec::new(),
            inclusion: InclusionBuilder::default(),
            is_internal: false,
            annotations: IndexMap::new(),
        }
    }

    pub fn add_occurrence(&mut self, node: &'doc Positioned<Field>, condition: Option<Arc<IncludeCondition>>) {
        self.nodes.push(node);
        self.node_conditions.push(condition.clone());
        self.inclusion.add(condition);
    }

    pub fn internal(response_name: Name, field: FieldDefinition) -> Self {
        Self {
            inclusion: InclusionBuilder::always(),
            is_internal: true,
            ..Self::new(response_name, field)
        }
    }
}
