use async_graphql_value::Name;
use indexmap::IndexMap;
use schema::Schema;

use super::{selection::SelectionBuilder, CompileError};

/// Rewrites the fields of a selection set before it is sealed.
///
/// Optimizers run for every concrete type of every selection set they're registered for, and
/// may add internal selections, remove selections or annotate them. An error aborts the
/// compilation of the whole operation.
pub trait SelectionSetOptimizer: Send + Sync + 'static {
    fn optimize(&self, ctx: &mut SelectionSetOptimizerContext<'_, '_>) -> Result<(), CompileError>;
}

impl<F> SelectionSetOptimizer for F
where
    F: Fn(&mut SelectionSetOptimizerContext<'_, '_>) -> Result<(), CompileError> + Send + Sync + 'static,
{
    fn optimize(&self, ctx: &mut SelectionSetOptimizerContext<'_, '_>) -> Result<(), CompileError> {
        self(ctx)
    }
}

pub struct SelectionSetOptimizerContext<'a, 'doc> {
    schema: &'a Schema,
    type_name: &'a Name,
    parent_field: Option<&'a (Name, Name)>,
    selections: &'a mut IndexMap<Name, SelectionBuilder<'doc>>,
}

impl<'a, 'doc> SelectionSetOptimizerContext<'a, 'doc> {
    pub(super) fn new(
        schema: &'a Schema,
        type_name: &'a Name,
        parent_field: Option<&'a (Name, Name)>,
        selections: &'a mut IndexMap<Name, SelectionBuilder<'doc>>,
    ) -> Self {
        Self {
            schema,
            type_name,
            parent_field,
            selections,
        }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Concrete object type of the selection set.
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    /// Type and name of the field owning the selection set, none at the root.
    pub fn parent_field(&self) -> Option<(&str, &str)> {
        self.parent_field.map(|(ty, field)| (ty.as_str(), field.as_str()))
    }

    pub fn response_names(&self) -> impl Iterator<Item = &Name> {
        self.selections.keys()
    }

    pub fn contains(&self, response_name: &str) -> bool {
        self.selections.contains_key(response_name)
    }

    pub fn field_name(&self, response_name: &str) -> Option<&Name> {
        self.selections.get(response_name).map(|selection| &selection.field.name)
    }

    /// Adds a leaf field absent from the document. Does nothing if the response name is taken.
    pub fn add_internal_selection(&mut self, response_name: &str, field_name: &str) -> Result<(), CompileError> {
        if self.selections.contains_key(response_name) {
            return Ok(());
        }
        let Some(field) = self.schema.field(self.type_name, field_name) else {
            return Err(CompileError::UnknownField {
                container: self.type_name.to_string(),
                name: field_name.to_string(),
                pos: Default::default(),
            });
        };
        if !self.schema.is_leaf(field.ty.named_type()) {
            return Err(CompileError::InternalSelectionNotLeaf {
                container: self.type_name.to_string(),
                name: field_name.to_string(),
            });
        }
        let response_name = Name::new(response_name);
        self.selections.insert(
            response_name.clone(),
            SelectionBuilder::internal(response_name, field.clone()),
        );
        Ok(())
    }

    /// Drops a selection, the following ones move up one response index.
    pub fn remove_selection(&mut self, response_name: &str) -> bool {
        self.selections.shift_remove(response_name).is_some()
    }

    pub fn annotate(&mut self, response_name: &str, key: &str, value: impl Into<serde_json::Value>) -> bool {
        match self.selections.get_mut(response_name) {
            Some(selection) => {
                selection.annotations.insert(Name::new(key), value.into());
                true
            }
            None => false,
        }
    }
}
