use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use async_graphql_value::Name;
use error::{ErrorCode, GraphqlError};
use schema::TypeRef;

use super::{ExecutionContext, ResolverTaskDefinition};
use crate::{
    operation::Selection,
    resolver::{FieldValue, ParentValue, ScopedData},
    response::{ParentLink, PathSegment, ResponsePath, ResultParent, ResultValue},
};

/// A non-null position completed to null. The caller owns the repair.
#[derive(Debug)]
pub(super) struct NonNullFailure;

type Completion = Result<ResultValue, NonNullFailure>;

/// Turns the value returned by the resolver of a field into result nodes, following the static
/// type of the field. Child fields are registered as new tasks, never resolved inline.
pub(super) struct ValueCompleter<'a> {
    ctx: &'a Arc<ExecutionContext>,
    selection: &'a Arc<Selection>,
    field_path: &'a ResponsePath,
    data: &'a ScopedData,
}

impl<'a> ValueCompleter<'a> {
    pub fn new(
        ctx: &'a Arc<ExecutionContext>,
        selection: &'a Arc<Selection>,
        field_path: &'a ResponsePath,
        data: &'a ScopedData,
    ) -> Self {
        Self {
            ctx,
            selection,
            field_path,
            data,
        }
    }

    pub fn complete_field(&self, value: FieldValue, link: ParentLink) -> Completion {
        self.complete(self.selection.ty(), value, self.field_path, link)
    }

    fn complete(&self, ty: &TypeRef, value: FieldValue, path: &ResponsePath, link: ParentLink) -> Completion {
        let value = self.report_errors(value, path);
        match ty {
            TypeRef::NonNull(inner) => {
                let completed = self.complete(inner, value, path, link)?;
                if !completed.is_null() {
                    return Ok(completed);
                }
                // List items have no violation of their own: the error is added here and the
                // field is marked so the repair pass doesn't add another one.
                if matches!(path.last(), Some(PathSegment::Index(_))) {
                    if !self.ctx.result.has_error_at(path) {
                        self.ctx.result.add_error(
                            GraphqlError::non_null_violation(path).with_locations(self.selection.locations()),
                        );
                    }
                    self.ctx.result.mark_field_error(self.field_path);
                }
                Err(NonNullFailure)
            }
            _ if value.is_null() => Ok(ResultValue::Null),
            TypeRef::List(item_ty) => Ok(self.complete_list(item_ty, value, path, link)),
            TypeRef::Named(name) if self.ctx.schema.is_leaf(name) => Ok(self.complete_leaf(name, value, path)),
            TypeRef::Named(name) if self.ctx.schema.is_composite(name) => {
                Ok(self.complete_composite(name, value, path, link))
            }
            TypeRef::Named(name) => {
                tracing::error!("Unexpected value completion error: {name} is neither a leaf nor a composite type");
                self.add_error(GraphqlError::internal_server_error(), path);
                Ok(ResultValue::Null)
            }
        }
    }

    /// Reports error values, which complete as null.
    fn report_errors(&self, value: FieldValue, path: &ResponsePath) -> FieldValue {
        match value {
            FieldValue::Error(error) => {
                self.ctx
                    .result
                    .add_error(error.into_graphql_error(path, self.selection.locations()));
                FieldValue::Null
            }
            FieldValue::Errors(errors) => {
                let locations = self.selection.locations();
                self.ctx.result.add_errors(
                    errors
                        .into_iter()
                        .map(|error| error.into_graphql_error(path, locations.clone())),
                );
                FieldValue::Null
            }
            value => value,
        }
    }

    fn complete_list(&self, item_ty: &TypeRef, value: FieldValue, path: &ResponsePath, link: ParentLink) -> ResultValue {
        let items: Box<dyn Iterator<Item = FieldValue>> = match value {
            FieldValue::List(items) => Box::new(items.into_iter()),
            FieldValue::Iter(items) => items,
            FieldValue::Value(serde_json::Value::Array(items)) => Box::new(items.into_iter().map(FieldValue::Value)),
            _ => {
                self.add_error(
                    GraphqlError::new(
                        format!("Expected a list for field '{}'", self.selection.field_name()),
                        ErrorCode::ResolverError,
                    ),
                    path,
                );
                return ResultValue::Null;
            }
        };

        let is_nullable = item_ty.is_nullable();
        let has_object_items = !item_ty.is_list() && self.ctx.schema.is_composite(item_ty.named_type());
        let (container, list) = if has_object_items {
            let id = self.ctx.result.rent_result_map_list(link, is_nullable);
            (ResultParent::MapList(id), ResultValue::MapList(id))
        } else {
            let id = self.ctx.result.rent_result_list(link, is_nullable);
            (ResultParent::List(id), ResultValue::List(id))
        };

        let mut completed = Vec::new();
        for (index, item) in items.enumerate() {
            match self.complete(item_ty, item, &path.index(index), ParentLink::new(container, index)) {
                Ok(value) => completed.push(value),
                // A non-null item failed, the whole list is null. Its error is already reported,
                // so an enclosing non-null list item must not add another one.
                Err(NonNullFailure) => {
                    self.ctx.result.mark_field_error(path);
                    return ResultValue::Null;
                }
            }
        }

        match container {
            ResultParent::MapList(id) => self.ctx.result.set_map_list_items(id, completed),
            ResultParent::List(id) => self.ctx.result.set_list_items(id, completed),
            ResultParent::Map(_) => {}
        }
        list
    }

    fn complete_leaf(&self, type_name: &Name, value: FieldValue, path: &ResponsePath) -> ResultValue {
        let runtime_value = match value {
            FieldValue::Value(value) => Ok(value),
            FieldValue::Object(object) => self
                .ctx
                .resolvers
                .converter_for(type_name)
                .and_then(|converter| converter.convert(&object))
                .ok_or_else(|| format!("No conversion of {object:?} into '{type_name}'")),
            FieldValue::List(_) | FieldValue::Iter(_) => Err(format!("'{type_name}' cannot represent a list")),
            FieldValue::Null | FieldValue::Error(_) | FieldValue::Errors(_) => Ok(serde_json::Value::Null),
        };

        match runtime_value.and_then(|value| self.ctx.schema.serialize_leaf(type_name, value)) {
            Ok(value) => ResultValue::Leaf(value),
            Err(message) => {
                self.add_error(GraphqlError::new(message, ErrorCode::LeafSerializationError), path);
                ResultValue::Null
            }
        }
    }

    fn complete_composite(
        &self,
        type_name: &Name,
        value: FieldValue,
        path: &ResponsePath,
        link: ParentLink,
    ) -> ResultValue {
        let parent = match value {
            FieldValue::Value(value) => ParentValue::json(value),
            FieldValue::Object(object) => ParentValue::Opaque(object),
            _ => {
                self.add_error(
                    GraphqlError::new(
                        format!("Expected an object of type '{type_name}'"),
                        ErrorCode::ResolverError,
                    ),
                    path,
                );
                return ResultValue::Null;
            }
        };

        let concrete_type = if self.ctx.schema.is_abstract(type_name) {
            match self.resolve_abstract_type(type_name, &parent) {
                Ok(name) => name,
                Err(message) => {
                    self.add_error(GraphqlError::new(message, ErrorCode::AbstractTypeResolutionError), path);
                    return ResultValue::Null;
                }
            }
        } else {
            type_name.clone()
        };

        let Some(fields) = self
            .selection
            .selection_set()
            .and_then(|id| self.ctx.operation.collect_fields(id, &concrete_type))
        else {
            tracing::error!(
                "No selection set compiled for {concrete_type} below {}",
                self.selection.field_name()
            );
            self.add_error(GraphqlError::internal_server_error(), path);
            return ResultValue::Null;
        };

        let map = self.ctx.result.rent_result_map(fields.len(), Some(link));
        for selection in fields.included(&self.ctx.variables, self.ctx.allow_internal_selections) {
            self.ctx.backlog.register(
                self.ctx,
                ResolverTaskDefinition {
                    selection: selection.clone(),
                    parent: parent.clone(),
                    target: map,
                    parent_path: path.clone(),
                    data: self.data.clone(),
                },
            );
        }
        ResultValue::Map(map)
    }

    fn resolve_abstract_type(&self, abstract_type: &Name, parent: &ParentValue) -> Result<Name, String> {
        let resolved = match self.ctx.resolvers.type_resolver(abstract_type) {
            Some(resolver) => catch_unwind(AssertUnwindSafe(|| resolver.resolve_type(parent)))
                .map_err(|_| format!("Type resolver of '{abstract_type}' panicked"))?,
            None => None,
        };
        let Some(type_name) = resolved.or_else(|| parent.typename().map(str::to_string)) else {
            return Err(format!("Unable to resolve the concrete type of abstract type '{abstract_type}'"));
        };
        if !self.ctx.schema.is_possible_type(abstract_type, &type_name) {
            return Err(format!("'{type_name}' is not a possible type of '{abstract_type}'"));
        }
        Ok(Name::new(type_name))
    }

    fn add_error(&self, error: GraphqlError, path: &ResponsePath) {
        self.ctx
            .result
            .add_error(error.with_path(path).with_locations(self.selection.locations()));
    }
}
