mod argument;
mod coercion;
mod compiler;
mod condition;
mod directive;
mod error;
mod fragment;
mod optimizer;
mod pipeline;
mod selection;
mod variables;

pub use argument::{ArgumentError, ArgumentValues, PreparedArgument, PreparedArguments};
pub use compiler::{compile, CompiledOperation};
pub use condition::{ConditionValue, IncludeCondition, Inclusion};
pub use directive::CompiledDirective;
pub use error::{CompileError, InputValueError, ValuePath};
pub use optimizer::{SelectionSetOptimizer, SelectionSetOptimizerContext};
pub use pipeline::Next;
pub use selection::{Selection, SelectionId, SelectionSet, SelectionSetId};
pub use variables::{VariableDefinitionRecord, Variables};

pub(crate) use pipeline::FieldPipeline;
pub(crate) use variables::bind_variables;
