use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_graphql_parser::{
    types::{FragmentDefinition, OperationDefinition, OperationType, Selection as SelectionNode, SelectionSet as SelectionSetNode},
    Pos, Positioned,
};
use async_graphql_value::Name;
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use schema::{FieldDefinition, Schema, TypeRef};

use super::{
    condition::{derive_condition, DerivedCondition, IncludeCondition},
    directive::compile_directives,
    fragment::FragmentResolver,
    selection::{SelectionBuilder, SelectionVariants},
    CompileError, FieldPipeline, PreparedArguments, Selection, SelectionId, SelectionSet, SelectionSetId,
    SelectionSetOptimizer, SelectionSetOptimizerContext, VariableDefinitionRecord,
};
use crate::resolver::Resolvers;

/// Executable plan of an operation, immutable and shared by every request using it.
pub struct CompiledOperation {
    name: Option<Name>,
    ty: OperationType,
    root_type: Name,
    /// Indexed by selection set id, the root being the first one.
    variants: Vec<SelectionVariants>,
    variable_definitions: Vec<VariableDefinitionRecord>,
    selection_count: usize,
}

impl CompiledOperation {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ty(&self) -> OperationType {
        self.ty
    }

    pub fn root_type(&self) -> &Name {
        &self.root_type
    }

    pub fn root_selection_set(&self) -> Option<&Arc<SelectionSet>> {
        self.collect_fields(SelectionSetId(0), &self.root_type)
    }

    /// Selections of a selection set applicable to a concrete object type.
    pub fn collect_fields(&self, id: SelectionSetId, type_name: &str) -> Option<&Arc<SelectionSet>> {
        self.variants.get(id.index())?.get(type_name)
    }

    pub fn variable_definitions(&self) -> &[VariableDefinitionRecord] {
        &self.variable_definitions
    }

    pub fn selection_set_count(&self) -> usize {
        self.variants.len()
    }

    /// Number of selections across every selection set and type.
    pub fn selection_count(&self) -> usize {
        self.selection_count
    }

    /// Root fields of mutations run one after the other.
    pub fn is_serial(&self) -> bool {
        self.ty == OperationType::Mutation
    }
}

impl std::fmt::Debug for CompiledOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledOperation")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("root_type", &self.root_type)
            .field("selection_sets", &self.variants.len())
            .field("selections", &self.selection_count)
            .finish_non_exhaustive()
    }
}

/// Compiles an operation of a validated document into selection sets for every concrete type
/// they may apply to.
///
/// `optimizers` apply to every selection set of the operation, field-scoped optimizers registered
/// on the resolvers only to the selection sets below their field.
#[tracing::instrument(name = "compile_operation", skip_all, fields(operation.name = name.map(Name::as_str)))]
pub fn compile(
    schema: &Schema,
    resolvers: &Resolvers,
    fragments: &HashMap<Name, Positioned<FragmentDefinition>>,
    name: Option<&Name>,
    operation: &Positioned<OperationDefinition>,
    optimizers: &[Arc<dyn SelectionSetOptimizer>],
) -> Result<CompiledOperation, CompileError> {
    let ty = operation.node.ty;
    let root_type = schema
        .root_type(ty)
        .ok_or(CompileError::MissingRootType { operation_type: ty })?
        .name
        .clone();

    let mut compiler = SelectionCompiler::new(schema, resolvers, fragments);
    compiler.enqueue_root(&root_type, &operation.node.selection_set, optimizers.to_vec());
    while let Some(pending) = compiler.backlog.pop_front() {
        compiler.compile_selection_set(pending)?;
    }

    let variable_definitions = operation
        .node
        .variable_definitions
        .iter()
        .map(|definition| VariableDefinitionRecord {
            name: definition.node.name.node.clone(),
            ty: TypeRef::from(&definition.node.var_type.node),
            default_value: definition.node.default_value.as_ref().map(|value| value.node.clone()),
            pos: definition.pos,
        })
        .collect();

    Ok(CompiledOperation {
        name: name.cloned(),
        ty,
        root_type,
        variants: compiler.variants,
        variable_definitions,
        selection_count: compiler.next_selection_id as usize,
    })
}

/// Sub-selections of one occurrence of a field, with the condition that occurrence was collected under.
type ChildNode<'doc> = (&'doc Positioned<SelectionSetNode>, Option<Arc<IncludeCondition>>);

/// Identifies a merged child selection set: parent type, occurrences, and the owning fields from
/// the root when optimizers apply to it.
type ChildKey = (Name, Vec<(Pos, Option<Arc<IncludeCondition>>)>, Option<Vec<(Name, Name)>>);

/// A selection set node group waiting to be compiled for one concrete type.
struct PendingSelectionSet<'doc> {
    id: SelectionSetId,
    type_name: Name,
    nodes: Vec<ChildNode<'doc>>,
    /// Type and name of the fields owning this selection set, from the root.
    owners: Vec<(Name, Name)>,
    optimizers: Vec<Arc<dyn SelectionSetOptimizer>>,
}

struct SelectionCompiler<'doc> {
    schema: &'doc Schema,
    resolvers: &'doc Resolvers,
    fragments: FragmentResolver<'doc>,
    selection_set_ids: FxHashMap<ChildKey, SelectionSetId>,
    variants: Vec<SelectionVariants>,
    queued: FxHashSet<(SelectionSetId, Name)>,
    backlog: VecDeque<PendingSelectionSet<'doc>>,
    next_selection_id: u32,
}

impl<'doc> SelectionCompiler<'doc> {
    fn new(
        schema: &'doc Schema,
        resolvers: &'doc Resolvers,
        fragments: &'doc HashMap<Name, Positioned<FragmentDefinition>>,
    ) -> Self {
        Self {
            schema,
            resolvers,
            fragments: FragmentResolver::new(schema, fragments),
            selection_set_ids: FxHashMap::default(),
            variants: Vec::new(),
            queued: FxHashSet::default(),
            backlog: VecDeque::new(),
            next_selection_id: 0,
        }
    }

    fn enqueue_root(
        &mut self,
        root_type: &Name,
        selection_set: &'doc Positioned<SelectionSetNode>,
        optimizers: Vec<Arc<dyn SelectionSetOptimizer>>,
    ) {
        let id = SelectionSetId(0);
        self.variants.push(SelectionVariants::default());
        self.queued.insert((id, root_type.clone()));
        self.backlog.push_back(PendingSelectionSet {
            id,
            type_name: root_type.clone(),
            nodes: vec![(selection_set, None)],
            owners: Vec::new(),
            optimizers,
        });
    }

    fn compile_selection_set(&mut self, pending: PendingSelectionSet<'doc>) -> Result<(), CompileError> {
        let mut fields = IndexMap::new();
        for (node, condition) in &pending.nodes {
            self.collect_fields(&pending.type_name, *node, condition.as_ref(), &mut fields)?;
        }

        if !pending.optimizers.is_empty() {
            let mut ctx = SelectionSetOptimizerContext::new(
                self.schema,
                &pending.type_name,
                pending.owners.last(),
                &mut fields,
            );
            for optimizer in &pending.optimizers {
                optimizer.optimize(&mut ctx)?;
            }
        }

        let implements = self
            .schema
            .object(&pending.type_name)
            .map(|object| object.implements.clone())
            .unwrap_or_default();

        let mut selections = Vec::with_capacity(fields.len());
        for (response_index, builder) in fields.into_values().enumerate() {
            let selection = self.seal(&pending, &implements, response_index, builder)?;
            selections.push(Arc::new(selection));
        }

        let is_conditional = selections
            .iter()
            .any(|selection| selection.is_internal || selection.inclusion.is_conditional());
        self.variants[pending.id.index()].insert(
            pending.type_name,
            Arc::new(SelectionSet {
                selections,
                is_conditional,
            }),
        );
        Ok(())
    }

    /// Merges the fields of a selection set node, and of the fragments it spreads, into `fields`
    /// keyed by response name in order of first occurrence.
    fn collect_fields(
        &mut self,
        type_name: &Name,
        selection_set: &'doc Positioned<SelectionSetNode>,
        inherited: Option<&Arc<IncludeCondition>>,
        fields: &mut IndexMap<Name, SelectionBuilder<'doc>>,
    ) -> Result<(), CompileError> {
        for item in &selection_set.node.items {
            match &item.node {
                SelectionNode::Field(field) => {
                    let DerivedCondition::Included(condition) = derive_condition(&field.node.directives, inherited)
                    else {
                        continue;
                    };
                    let field_name = &field.node.name.node;
                    let Some(definition) = self.schema.field(type_name, field_name) else {
                        return Err(CompileError::UnknownField {
                            container: type_name.to_string(),
                            name: field_name.to_string(),
                            pos: field.pos,
                        });
                    };
                    let response_name = field.node.response_key().node.clone();
                    let selection = fields
                        .entry(response_name.clone())
                        .or_insert_with(|| SelectionBuilder::new(response_name, definition.clone()));
                    selection.add_occurrence(field, condition);
                }
                SelectionNode::FragmentSpread(spread) => {
                    let DerivedCondition::Included(condition) = derive_condition(&spread.node.directives, inherited)
                    else {
                        continue;
                    };
                    let Some(fragment) = self.fragments.resolve_named(spread.node.fragment_name.node.as_str()) else {
                        continue;
                    };
                    if !fragment.applies_to(self.schema, type_name) {
                        continue;
                    }
                    let DerivedCondition::Included(condition) =
                        derive_condition(fragment.directives, condition.as_ref())
                    else {
                        continue;
                    };
                    self.collect_fields(type_name, fragment.selection_set, condition.as_ref(), fields)?;
                }
                SelectionNode::InlineFragment(inline_fragment) => {
                    let Some(fragment) = self.fragments.resolve_inline(type_name, inline_fragment) else {
                        continue;
                    };
                    if !fragment.applies_to(self.schema, type_name) {
                        continue;
                    }
                    let DerivedCondition::Included(condition) = derive_condition(fragment.directives, inherited) else {
                        continue;
                    };
                    self.collect_fields(type_name, fragment.selection_set, condition.as_ref(), fields)?;
                }
            }
        }
        Ok(())
    }

    fn seal(
        &mut self,
        pending: &PendingSelectionSet<'doc>,
        implements: &[Name],
        response_index: usize,
        builder: SelectionBuilder<'doc>,
    ) -> Result<Selection, CompileError> {
        let SelectionBuilder {
            response_name,
            field,
            nodes,
            node_conditions,
            inclusion,
            is_internal,
            annotations,
        } = builder;

        let pos = nodes.first().map(|node| node.pos).unwrap_or_default();
        let child_nodes = nodes
            .iter()
            .zip(node_conditions)
            .map(|(node, condition)| (&node.node.selection_set, condition))
            .filter(|(selection_set, _)| !selection_set.node.items.is_empty())
            .collect::<Vec<_>>();

        let selection_set = if self.schema.is_composite(field.ty.named_type()) {
            if child_nodes.is_empty() {
                return Err(CompileError::MissingSelectionSet {
                    name: field.name.to_string(),
                    ty: field.ty.to_string(),
                    pos,
                });
            }
            Some(self.enqueue_child(pending, &field, child_nodes))
        } else {
            if !child_nodes.is_empty() {
                return Err(CompileError::SelectionSetOnLeaf {
                    name: field.name.to_string(),
                    ty: field.ty.named_type().to_string(),
                    pos,
                });
            }
            None
        };

        let arguments = match nodes.first() {
            Some(node) => PreparedArguments::prepare(self.schema, &field, &node.node.arguments),
            None => PreparedArguments::prepare(self.schema, &field, &[]),
        };
        let directives = compile_directives(self.schema, &field, &nodes);
        let resolver = self
            .resolvers
            .field_resolver_for(&pending.type_name, implements, &field.name);
        let pipeline = FieldPipeline::build(resolver, &directives, self.resolvers);

        let id = SelectionId(self.next_selection_id);
        self.next_selection_id += 1;

        Ok(Selection {
            id,
            response_name,
            response_index,
            declaring_type: pending.type_name.clone(),
            field,
            nodes: nodes.iter().map(|node| node.pos).collect(),
            pipeline,
            arguments,
            directives,
            inclusion: inclusion.build(),
            is_internal,
            annotations,
            selection_set,
        })
    }

    /// Queues the merged child selection set of a composite field once per possible type.
    fn enqueue_child(
        &mut self,
        pending: &PendingSelectionSet<'doc>,
        field: &FieldDefinition,
        nodes: Vec<ChildNode<'doc>>,
    ) -> SelectionSetId {
        let mut optimizers = pending.optimizers.clone();
        optimizers.extend(
            self.resolvers
                .optimizers_below(&pending.type_name, &field.name)
                .iter()
                .cloned(),
        );
        let mut owners = pending.owners.clone();
        owners.push((pending.type_name.clone(), field.name.clone()));

        // Optimizers see their owning fields, so a set reached through different fields can't be shared.
        let key = (
            pending.type_name.clone(),
            nodes
                .iter()
                .map(|(node, condition)| (node.pos, condition.clone()))
                .collect::<Vec<_>>(),
            (!optimizers.is_empty()).then(|| owners.clone()),
        );
        let id = match self.selection_set_ids.get(&key) {
            Some(id) => *id,
            None => {
                let id = SelectionSetId(self.variants.len() as u32);
                self.variants.push(SelectionVariants::default());
                self.selection_set_ids.insert(key, id);
                id
            }
        };

        for possible_type in self.schema.possible_types(field.ty.named_type()) {
            if self.queued.insert((id, possible_type.clone())) {
                self.backlog.push_back(PendingSelectionSet {
                    id,
                    type_name: possible_type.clone(),
                    nodes: nodes.clone(),
                    owners: owners.clone(),
                    optimizers: optimizers.clone(),
                });
            }
        }
        id
    }
}
