use std::borrow::Cow;

use async_graphql_value::{ConstValue, Value};
use schema::{Schema, TypeDefinitionKind, TypeRef};

use super::{
    error::{InputValueError, ValuePath, ValuePathSegment},
    Variables,
};

/// Substitutes variable references with their bound values.
///
/// Sub-trees without any variable are returned as is. Unbound variables become null.
pub(crate) fn rewrite_variables<'a>(value: &'a Value, variables: &Variables) -> Cow<'a, Value> {
    match value {
        Value::Variable(name) => Cow::Owned(
            variables
                .get(name)
                .cloned()
                .map(ConstValue::into_value)
                .unwrap_or(Value::Null),
        ),
        Value::List(items) => {
            let rewritten = items
                .iter()
                .map(|item| rewrite_variables(item, variables))
                .collect::<Vec<_>>();
            if rewritten.iter().all(|item| matches!(item, Cow::Borrowed(_))) {
                return Cow::Borrowed(value);
            }
            Cow::Owned(Value::List(rewritten.into_iter().map(Cow::into_owned).collect()))
        }
        Value::Object(fields) => {
            let rewritten = fields
                .iter()
                .map(|(name, field)| (name, rewrite_variables(field, variables)))
                .collect::<Vec<_>>();
            if rewritten.iter().all(|(_, field)| matches!(field, Cow::Borrowed(_))) {
                return Cow::Borrowed(value);
            }
            Cow::Owned(Value::Object(
                rewritten
                    .into_iter()
                    .map(|(name, field)| (name.clone(), field.into_owned()))
                    .collect(),
            ))
        }
        _ => Cow::Borrowed(value),
    }
}

pub(crate) fn contains_variables(value: &Value) -> bool {
    match value {
        Value::Variable(_) => true,
        Value::List(items) => items.iter().any(contains_variables),
        Value::Object(fields) => fields.values().any(contains_variables),
        _ => false,
    }
}

/// Coerces a variable-free input value into its runtime JSON representation.
pub(crate) fn coerce_input_value(schema: &Schema, ty: &TypeRef, value: &Value) -> Result<serde_json::Value, InputValueError> {
    InputValueCoercion {
        schema,
        value_path: Vec::new(),
    }
    .coerce(ty, value)
}

struct InputValueCoercion<'a> {
    schema: &'a Schema,
    value_path: Vec<ValuePathSegment>,
}

impl InputValueCoercion<'_> {
    fn path(&self) -> ValuePath {
        ValuePath(self.value_path.clone())
    }

    fn coerce(&mut self, ty: &TypeRef, value: &Value) -> Result<serde_json::Value, InputValueError> {
        match ty {
            TypeRef::NonNull(inner) => {
                if is_null(value) {
                    return Err(InputValueError::UnexpectedNull {
                        expected: ty.to_string(),
                        path: self.path(),
                    });
                }
                self.coerce(inner, value)
            }
            _ if is_null(value) => Ok(serde_json::Value::Null),
            TypeRef::List(item_ty) => match value {
                Value::List(items) => {
                    let mut coerced = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        self.value_path.push(ValuePathSegment::Index(index));
                        coerced.push(self.coerce(item_ty, item)?);
                        self.value_path.pop();
                    }
                    Ok(serde_json::Value::Array(coerced))
                }
                // A single value is accepted where a list is expected.
                value => Ok(serde_json::Value::Array(vec![self.coerce(item_ty, value)?])),
            },
            TypeRef::Named(name) => self.coerce_named_type(name, value),
        }
    }

    fn coerce_named_type(&mut self, name: &str, value: &Value) -> Result<serde_json::Value, InputValueError> {
        let definition = self
            .schema
            .type_definition(name)
            .ok_or_else(|| InputValueError::UnknownType(name.to_string()))?;

        match &definition.kind {
            TypeDefinitionKind::Scalar | TypeDefinitionKind::Enum(_) => {
                let Some(value) = value.clone().into_const() else {
                    return Ok(serde_json::Value::Null);
                };
                self.schema
                    .parse_leaf_literal(name, &value)
                    .map_err(|message| InputValueError::InvalidLeaf {
                        message,
                        path: self.path(),
                    })
            }
            TypeDefinitionKind::InputObject(input_object) => {
                let Value::Object(fields) = value else {
                    return Err(InputValueError::NotAnObject {
                        expected: name.to_string(),
                        actual: value_kind(value),
                        path: self.path(),
                    });
                };

                if let Some(unknown) = fields.keys().find(|key| !input_object.fields.contains_key(key.as_str())) {
                    return Err(InputValueError::UnknownInputField {
                        ty: name.to_string(),
                        name: unknown.to_string(),
                        path: self.path(),
                    });
                }

                let mut coerced = serde_json::Map::with_capacity(input_object.fields.len());
                for (field_name, field) in &input_object.fields {
                    self.value_path.push(ValuePathSegment::Field(field_name.to_string()));
                    let value = match (fields.get(field_name), &field.default_value) {
                        (Some(value), _) => Some(self.coerce(&field.ty, value)?),
                        (None, Some(default_value)) => Some(self.coerce(&field.ty, &default_value.clone().into_value())?),
                        (None, None) if field.ty.is_non_null() => {
                            self.value_path.pop();
                            return Err(InputValueError::MissingInputField {
                                ty: name.to_string(),
                                name: field_name.to_string(),
                                path: self.path(),
                            });
                        }
                        (None, None) => None,
                    };
                    self.value_path.pop();
                    if let Some(value) = value {
                        coerced.insert(field_name.to_string(), value);
                    }
                }
                Ok(serde_json::Value::Object(coerced))
            }
            _ => Err(InputValueError::UnknownType(name.to_string())),
        }
    }
}

fn is_null(value: &Value) -> bool {
    // Variables are rewritten before coercion, a remaining one was unbound.
    matches!(value, Value::Null | Value::Variable(_))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Variable(_) | Value::Null => "null",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Boolean(_) => "boolean",
        Value::Binary(_) => "binary",
        Value::Enum(_) => "enum",
        Value::List(_) => "list",
        Value::Object(_) => "object",
    }
}
