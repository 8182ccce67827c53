use async_graphql_value::{ConstValue, Name};
use error::{ErrorCode, GraphqlError};
use indexmap::IndexMap;
use schema::TypeRef;

use super::error::to_location;

/// Variable values bound to a request.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<Name, ConstValue>);

impl Variables {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::default()),
            value => serde_json::from_value(value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: ConstValue) {
        self.0.insert(Name::new(name), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: AsRef<str>> FromIterator<(N, ConstValue)> for Variables {
    fn from_iter<T: IntoIterator<Item = (N, ConstValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(name, value)| (Name::new(name), value)).collect())
    }
}

/// A variable declared by the operation.
#[derive(Debug, Clone)]
pub struct VariableDefinitionRecord {
    pub name: Name,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
    pub pos: async_graphql_parser::Pos,
}

/// Fills in default values and rejects missing required variables.
///
/// Values themselves are coerced when the arguments using them are, so that an error only
/// surfaces for fields that actually execute.
pub(crate) fn bind_variables(
    definitions: &[VariableDefinitionRecord],
    mut variables: Variables,
) -> Result<Variables, Vec<GraphqlError>> {
    let mut errors = Vec::new();

    for definition in definitions {
        let reason = match variables.get(&definition.name) {
            None => match &definition.default_value {
                Some(default_value) => {
                    let default_value = default_value.clone();
                    variables.insert(&definition.name, default_value);
                    continue;
                }
                None if definition.ty.is_non_null() => "was not provided",
                None => continue,
            },
            Some(ConstValue::Null) if definition.ty.is_non_null() => "must not be null",
            Some(_) => continue,
        };
        errors.push(
            GraphqlError::new(
                format!(
                    "Variable ${} of required type '{}' {reason}",
                    definition.name, definition.ty
                ),
                ErrorCode::VariableError,
            )
            .with_location(to_location(definition.pos)),
        );
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}
