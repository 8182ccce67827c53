use std::sync::Arc;

use async_graphql_parser::{types::Directive, Positioned};
use async_graphql_value::{ConstValue, Name, Value};

use super::Variables;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionValue {
    Literal(bool),
    Variable(Name),
}

impl ConditionValue {
    fn evaluate(&self, variables: &Variables) -> bool {
        match self {
            ConditionValue::Literal(value) => *value,
            ConditionValue::Variable(name) => matches!(variables.get(name), Some(ConstValue::Boolean(true))),
        }
    }
}

/// `@skip` / `@include` applied to a node, chained to the condition of the enclosing fragments.
///
/// Two conditions are equal when their own values and their whole parent chains are.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct IncludeCondition {
    skip: Option<ConditionValue>,
    include: Option<ConditionValue>,
    parent: Option<Arc<IncludeCondition>>,
}

impl IncludeCondition {
    pub fn is_included(&self, variables: &Variables) -> bool {
        if self.skip.as_ref().is_some_and(|skip| skip.evaluate(variables)) {
            return false;
        }
        if self.include.as_ref().is_some_and(|include| !include.evaluate(variables)) {
            return false;
        }
        self.parent
            .as_ref()
            .map_or(true, |parent| parent.is_included(variables))
    }

    pub fn parent(&self) -> Option<&Arc<IncludeCondition>> {
        self.parent.as_ref()
    }

    fn ancestors(self: &Arc<Self>) -> impl Iterator<Item = &Arc<IncludeCondition>> {
        std::iter::successors(Some(self), |condition| condition.parent.as_ref())
    }
}

pub(crate) enum DerivedCondition {
    /// Statically excluded, the node is dropped from the plan.
    Excluded,
    Included(Option<Arc<IncludeCondition>>),
}

/// Derives the condition of a node from its directives and the condition it inherits.
pub(crate) fn derive_condition(
    directives: &[Positioned<Directive>],
    inherited: Option<&Arc<IncludeCondition>>,
) -> DerivedCondition {
    let mut skip = None;
    let mut include = None;
    for directive in directives {
        match directive.node.name.node.as_str() {
            "skip" => skip = condition_argument(&directive.node),
            "include" => include = condition_argument(&directive.node),
            _ => {}
        }
    }

    if matches!(skip, Some(ConditionValue::Literal(true))) || matches!(include, Some(ConditionValue::Literal(false))) {
        return DerivedCondition::Excluded;
    }
    let skip = skip.filter(|value| value != &ConditionValue::Literal(false));
    let include = include.filter(|value| value != &ConditionValue::Literal(true));
    if skip.is_none() && include.is_none() {
        return DerivedCondition::Included(inherited.cloned());
    }

    // Already enforced by an enclosing fragment, no need to grow the chain.
    if let Some(inherited) = inherited {
        if inherited
            .ancestors()
            .any(|ancestor| ancestor.skip == skip && ancestor.include == include)
        {
            return DerivedCondition::Included(Some(inherited.clone()));
        }
    }

    DerivedCondition::Included(Some(Arc::new(IncludeCondition {
        skip,
        include,
        parent: inherited.cloned(),
    })))
}

fn condition_argument(directive: &Directive) -> Option<ConditionValue> {
    match directive.get_argument("if").map(|value| &value.node) {
        Some(Value::Boolean(value)) => Some(ConditionValue::Literal(*value)),
        Some(Value::Variable(name)) => Some(ConditionValue::Variable(name.clone())),
        _ => None,
    }
}

/// Whether a selection is scheduled for a given request.
#[derive(Debug, Clone, Default)]
pub enum Inclusion {
    #[default]
    Always,
    /// Included if any of the merged occurrences is.
    Conditional(Vec<Arc<IncludeCondition>>),
}

impl Inclusion {
    pub fn is_included(&self, variables: &Variables) -> bool {
        match self {
            Inclusion::Always => true,
            Inclusion::Conditional(conditions) => conditions.iter().any(|condition| condition.is_included(variables)),
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Inclusion::Conditional(_))
    }

    pub fn conditions(&self) -> &[Arc<IncludeCondition>] {
        match self {
            Inclusion::Always => &[],
            Inclusion::Conditional(conditions) => conditions,
        }
    }
}

/// Accumulates the conditions of every occurrence of a merged field.
#[derive(Default)]
pub(crate) struct InclusionBuilder {
    always: bool,
    conditions: Vec<Arc<IncludeCondition>>,
}

impl InclusionBuilder {
    pub fn always() -> Self {
        Self {
            always: true,
            conditions: Vec::new(),
        }
    }

    pub fn add(&mut self, condition: Option<Arc<IncludeCondition>>) {
        match condition {
            None => self.always = true,
            Some(condition) => {
                if !self.conditions.iter().any(|existing| existing == &condition) {
                    self.conditions.push(condition);
                }
            }
        }
    }

    pub fn build(self) -> Inclusion {
        if self.always {
            Inclusion::Always
        } else {
            Inclusion::Conditional(self.conditions)
        }
    }
}
