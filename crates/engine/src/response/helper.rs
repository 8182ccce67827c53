use std::sync::Arc;

use async_graphql_value::Name;
use error::{ErrorPath, GraphqlError};
use fxhash::FxHashSet;
use parking_lot::Mutex;

use crate::execution::ExecutionError;

use super::{
    ParentLink, ResponsePath, ResultListId, ResultMapId, ResultMapListId, ResultMemoryOwner, ResultParent, ResultPool,
    ResultSlot, ResultValue,
};

/// A non-nullable position that ended up null, repaired once every task settled.
#[derive(Debug)]
pub(crate) struct NonNullViolation {
    /// Path of the offending field, used for the error.
    pub path: ResponsePath,
    /// Slot holding the offending value.
    pub link: ParentLink,
}

pub(crate) struct BuiltResult {
    pub data: Option<ResultMapId>,
    pub errors: Vec<GraphqlError>,
    pub memory: Arc<ResultMemoryOwner>,
}

/// Result bookkeeping of a single request: node renting, error collection and the final
/// non-null repair pass.
///
/// Errors, error markers and violations each have their own lock so that tasks reporting
/// unrelated failures don't contend with each other.
pub(crate) struct ResultHelper {
    memory: Arc<ResultMemoryOwner>,
    errors: Mutex<Vec<GraphqlError>>,
    fields_with_errors: Mutex<FxHashSet<ErrorPath>>,
    non_null_violations: Mutex<Vec<NonNullViolation>>,
}

impl ResultHelper {
    pub fn new(pool: Arc<ResultPool>) -> Self {
        Self {
            memory: Arc::new(ResultMemoryOwner::new(pool)),
            errors: Default::default(),
            fields_with_errors: Default::default(),
            non_null_violations: Default::default(),
        }
    }

    pub fn rent_result_map(&self, capacity: usize, parent: Option<ParentLink>) -> ResultMapId {
        self.memory.rent_result_map(capacity, parent)
    }

    pub fn rent_result_map_list(&self, parent: ParentLink, is_nullable: bool) -> ResultMapListId {
        self.memory.rent_result_map_list(parent, is_nullable)
    }

    pub fn rent_result_list(&self, parent: ParentLink, is_nullable: bool) -> ResultListId {
        self.memory.rent_result_list(parent, is_nullable)
    }

    pub fn set_value(&self, map: ResultMapId, index: usize, name: &Name, value: ResultValue, is_nullable: bool) {
        self.memory.write(|arena| {
            if let Some(map) = arena.map_mut(map) {
                map.set_value(index, name.clone(), value, is_nullable);
            }
        });
    }

    pub fn set_map_list_items(&self, list: ResultMapListId, items: Vec<ResultValue>) {
        self.memory.write(|arena| {
            if let Some(list) = arena.map_list_mut(list) {
                list.set_items(items);
            }
        });
    }

    pub fn set_list_items(&self, list: ResultListId, items: Vec<ResultValue>) {
        self.memory.write(|arena| {
            if let Some(list) = arena.list_mut(list) {
                list.set_items(items);
            }
        });
    }

    /// Records an error. Its path is remembered so the repair pass doesn't add a generic
    /// non-null error for the same field.
    pub fn add_error(&self, error: GraphqlError) {
        if let Some(path) = &error.path {
            self.fields_with_errors.lock().insert(path.clone());
        }
        self.errors.lock().push(error);
    }

    pub fn add_errors(&self, errors: impl IntoIterator<Item = GraphqlError>) {
        let errors = errors.into_iter().collect::<Vec<_>>();
        {
            let mut fields_with_errors = self.fields_with_errors.lock();
            for path in errors.iter().filter_map(|error| error.path.as_ref()) {
                fields_with_errors.insert(path.clone());
            }
        }
        self.errors.lock().extend(errors);
    }

    /// Marks a field as failed without adding an error, used when the error was reported on
    /// one of its list items.
    pub fn mark_field_error(&self, path: &ResponsePath) {
        self.fields_with_errors.lock().insert(path.to_error_path());
    }

    pub fn has_error_at(&self, path: &ResponsePath) -> bool {
        self.fields_with_errors.lock().contains(&path.to_error_path())
    }

    pub fn add_non_null_violation(&self, violation: NonNullViolation) {
        self.non_null_violations.lock().push(violation);
    }

    /// Seals the tree and repairs every non-null violation, last recorded first.
    ///
    /// Must only run once all tasks settled, or were cancelled.
    pub fn build_result(&self, root: ResultMapId) -> Result<BuiltResult, ExecutionError> {
        let mut arena = self.memory.seal();
        let mut violations = std::mem::take(&mut *self.non_null_violations.lock());
        let fields_with_errors = std::mem::take(&mut *self.fields_with_errors.lock());
        let mut errors = std::mem::take(&mut *self.errors.lock());

        let mut data_is_null = false;
        let mut maps_with_removed_slots = Vec::new();

        while let Some(NonNullViolation { path, mut link }) = violations.pop() {
            let path = path.to_error_path();
            if !fields_with_errors.contains(&path) {
                errors.push(GraphqlError::non_null_violation(path));
            }

            loop {
                let index = link.index as usize;
                let parent = match link.container {
                    ResultParent::Map(id) => {
                        let map = arena
                            .map_mut(id)
                            .ok_or_else(|| ExecutionError::invariant(format!("Unknown result node {id}")))?;
                        match map.slot_mut(index) {
                            Some(ResultSlot::Set {
                                value,
                                is_nullable: true,
                                ..
                            }) => {
                                *value = ResultValue::Null;
                                break;
                            }
                            Some(_) => {
                                map.remove_value(index);
                                maps_with_removed_slots.push(id);
                                map.parent()
                            }
                            None => {
                                return Err(ExecutionError::invariant(format!(
                                    "Slot {index} is out of bounds for {id}"
                                )))
                            }
                        }
                    }
                    ResultParent::MapList(id) => {
                        let list = arena
                            .map_list_mut(id)
                            .ok_or_else(|| ExecutionError::invariant(format!("Unknown result node {id}")))?;
                        if list.is_nullable() && list.set_null(index) {
                            break;
                        }
                        Some(list.parent().ok_or_else(|| {
                            ExecutionError::invariant(format!("{id} has no parent"))
                        })?)
                    }
                    ResultParent::List(id) => {
                        let list = arena
                            .list_mut(id)
                            .ok_or_else(|| ExecutionError::invariant(format!("Unknown result node {id}")))?;
                        if list.is_nullable() && list.set_null(index) {
                            break;
                        }
                        Some(
                            list.parent()
                                .ok_or_else(|| ExecutionError::invariant(format!("{id} has no parent")))?,
                        )
                    }
                };

                match parent {
                    Some(parent) => link = parent,
                    // Reached the root object itself.
                    None => {
                        data_is_null = true;
                        break;
                    }
                }
            }
        }

        for id in maps_with_removed_slots {
            if let Some(map) = arena.map_mut(id) {
                map.complete();
            }
        }
        drop(arena);

        if data_is_null && errors.is_empty() {
            return Err(ExecutionError::invariant("Response has neither data nor errors"));
        }

        errors.sort_by(|left, right| left.path.cmp(&right.path));

        Ok(BuiltResult {
            data: (!data_is_null).then_some(root),
            errors,
            memory: self.memory.clone(),
        })
    }
}
