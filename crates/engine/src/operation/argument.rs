use async_graphql_parser::Positioned;
use async_graphql_value::{Name, Value};
use indexmap::IndexMap;
use schema::{FieldDefinition, Schema, TypeRef};

use super::{
    coercion::{coerce_input_value, contains_variables, rewrite_variables},
    error::{InputValueError, ValuePath},
    Variables,
};

/// Coerced argument values handed to resolvers, in schema declaration order.
pub type ArgumentValues = IndexMap<Name, serde_json::Value>;

#[derive(Debug, Clone)]
enum PreparedValue {
    /// Coerced once at compile time.
    Resolved(serde_json::Value),
    /// Depends on variables, coerced for each request.
    Literal(Value),
}

#[derive(Debug, Clone)]
pub struct PreparedArgument {
    name: Name,
    ty: TypeRef,
    value: PreparedValue,
    default_value: Option<Value>,
    error: Option<InputValueError>,
}

impl PreparedArgument {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_final(&self) -> bool {
        matches!(self.value, PreparedValue::Resolved(_)) || self.error.is_some()
    }

    pub fn error(&self) -> Option<&InputValueError> {
        self.error.as_ref()
    }
}

#[derive(Debug)]
pub struct ArgumentError {
    pub name: Name,
    pub error: InputValueError,
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid argument '{}': {}", self.name, self.error)
    }
}

/// Arguments of one selection, prepared from the first occurrence of the field.
#[derive(Debug, Clone, Default)]
pub struct PreparedArguments {
    arguments: Vec<PreparedArgument>,
}

impl PreparedArguments {
    pub(crate) fn prepare(
        schema: &Schema,
        field: &FieldDefinition,
        provided: &[(Positioned<Name>, Positioned<Value>)],
    ) -> Self {
        let arguments = field
            .arguments
            .values()
            .map(|definition| {
                let default_value = definition.default_value.clone().map(|value| value.into_value());
                let literal = provided
                    .iter()
                    .find(|(name, _)| name.node == definition.name)
                    .map(|(_, value)| value.node.clone())
                    .or_else(|| default_value.clone())
                    .unwrap_or(Value::Null);

                let mut argument = PreparedArgument {
                    name: definition.name.clone(),
                    ty: definition.ty.clone(),
                    value: PreparedValue::Literal(Value::Null),
                    default_value,
                    error: None,
                };

                // Nullability is checked on the literal, a variable is checked once bound.
                if definition.ty.is_non_null() && matches!(literal, Value::Null) {
                    argument.error = Some(InputValueError::UnexpectedNull {
                        expected: definition.ty.to_string(),
                        path: ValuePath::default(),
                    });
                    return argument;
                }

                let is_leaf = schema.is_leaf(definition.ty.named_type());
                if (is_leaf || matches!(literal, Value::Null)) && !contains_variables(&literal) {
                    match coerce_input_value(schema, &definition.ty, &literal) {
                        Ok(value) => argument.value = PreparedValue::Resolved(value),
                        Err(err) => argument.error = Some(err),
                    }
                } else {
                    argument.value = PreparedValue::Literal(literal);
                }
                argument
            })
            .collect();

        Self { arguments }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedArgument> {
        self.arguments.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn is_final(&self) -> bool {
        self.arguments.iter().all(PreparedArgument::is_final)
    }

    pub fn has_errors(&self) -> bool {
        self.arguments.iter().any(|argument| argument.error.is_some())
    }

    /// Resolves every argument against the request variables.
    ///
    /// All errors are returned, compile-time ones included.
    pub fn coerce(&self, schema: &Schema, variables: &Variables) -> Result<ArgumentValues, Vec<ArgumentError>> {
        let mut values = ArgumentValues::with_capacity(self.arguments.len());
        let mut errors = Vec::new();

        for argument in &self.arguments {
            if let Some(error) = &argument.error {
                errors.push(ArgumentError {
                    name: argument.name.clone(),
                    error: error.clone(),
                });
                continue;
            }
            let result = match &argument.value {
                PreparedValue::Resolved(value) => Ok(value.clone()),
                PreparedValue::Literal(literal) => {
                    let rewritten = match literal {
                        // An unbound variable falls back to the argument default.
                        Value::Variable(name) if !variables.contains(name) => match &argument.default_value {
                            Some(default_value) => std::borrow::Cow::Borrowed(default_value),
                            None => std::borrow::Cow::Owned(Value::Null),
                        },
                        literal => rewrite_variables(literal, variables),
                    };
                    coerce_input_value(schema, &argument.ty, &rewritten)
                }
            };
            match result {
                Ok(value) => {
                    values.insert(argument.name.clone(), value);
                }
                Err(error) => errors.push(ArgumentError {
                    name: argument.name.clone(),
                    error,
                }),
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }
}
