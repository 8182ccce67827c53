//! Resolution boundary: user resolvers, directive middlewares and the registry holding them.

mod context;
mod value;

use std::{future::Future, sync::Arc};

use async_graphql_value::Name;
use fxhash::FxHashMap;

pub use context::{FieldContext, ResolverContext, ScopedData};
pub use value::{FieldError, FieldValue, OpaqueValue, ParentValue};

use crate::operation::{CompiledDirective, Next, SelectionSetOptimizer};

/// Resolves the raw value of a field.
#[async_trait::async_trait]
pub trait FieldResolver: Send + Sync + 'static {
    async fn resolve(&self, ctx: &mut FieldContext) -> Result<FieldValue, FieldError>;
}

/// Wraps the resolution of a field on which its directive is applied.
///
/// Calling `next` runs the rest of the pipeline and leaves its result in the context.
#[async_trait::async_trait]
pub trait DirectiveMiddleware: Send + Sync + 'static {
    async fn invoke(&self, ctx: &mut FieldContext, directive: &CompiledDirective, next: Next<'_>);
}

/// Determines the concrete object type of a value of an interface or union.
pub trait TypeResolver: Send + Sync + 'static {
    fn resolve_type(&self, value: &ParentValue) -> Option<String>;
}

impl<F> TypeResolver for F
where
    F: Fn(&ParentValue) -> Option<String> + Send + Sync + 'static,
{
    fn resolve_type(&self, value: &ParentValue) -> Option<String> {
        self(value)
    }
}

/// Converts an opaque resolver value into the runtime representation of a leaf type.
pub trait ValueConverter: Send + Sync + 'static {
    fn convert(&self, value: &OpaqueValue) -> Option<serde_json::Value>;
}

impl<F> ValueConverter for F
where
    F: Fn(&OpaqueValue) -> Option<serde_json::Value> + Send + Sync + 'static,
{
    fn convert(&self, value: &OpaqueValue) -> Option<serde_json::Value> {
        self(value)
    }
}

struct FnResolver<F>(F);

#[async_trait::async_trait]
impl<F, Fut> FieldResolver for FnResolver<F>
where
    F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FieldValue, FieldError>> + Send + 'static,
{
    async fn resolve(&self, ctx: &mut FieldContext) -> Result<FieldValue, FieldError> {
        (self.0)(ctx.resolver_context()).await
    }
}

/// Reads the field from a JSON parent, by field name.
pub(crate) struct PropertyResolver;

#[async_trait::async_trait]
impl FieldResolver for PropertyResolver {
    async fn resolve(&self, ctx: &mut FieldContext) -> Result<FieldValue, FieldError> {
        let value = ctx
            .parent()
            .as_json()
            .and_then(|parent| parent.get(ctx.selection().field_name().as_str()))
            .cloned();
        Ok(value.map(FieldValue::Value).unwrap_or(FieldValue::Null))
    }
}

pub(crate) struct TypenameResolver;

#[async_trait::async_trait]
impl FieldResolver for TypenameResolver {
    async fn resolve(&self, ctx: &mut FieldContext) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::value(ctx.selection().declaring_type().as_str()))
    }
}

type FieldTable<T> = FxHashMap<Name, FxHashMap<Name, T>>;

/// Every user-provided piece of resolution logic, looked up once per selection at compile time.
#[derive(Clone)]
pub struct Resolvers {
    fields: FieldTable<Arc<dyn FieldResolver>>,
    directives: FxHashMap<Name, Arc<dyn DirectiveMiddleware>>,
    abstract_types: FxHashMap<Name, Arc<dyn TypeResolver>>,
    converters: FxHashMap<Name, Arc<dyn ValueConverter>>,
    field_optimizers: FieldTable<Vec<Arc<dyn SelectionSetOptimizer>>>,
    default_resolver: Arc<dyn FieldResolver>,
    typename_resolver: Arc<dyn FieldResolver>,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            fields: FxHashMap::default(),
            directives: FxHashMap::default(),
            abstract_types: FxHashMap::default(),
            converters: FxHashMap::default(),
            field_optimizers: FxHashMap::default(),
            default_resolver: Arc::new(PropertyResolver),
            typename_resolver: Arc::new(TypenameResolver),
        }
    }
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure resolver for `type_name.field_name`.
    #[must_use]
    pub fn field<F, Fut>(self, type_name: &str, field_name: &str, resolver: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FieldValue, FieldError>> + Send + 'static,
    {
        self.field_resolver(type_name, field_name, FnResolver(resolver))
    }

    #[must_use]
    pub fn field_resolver(mut self, type_name: &str, field_name: &str, resolver: impl FieldResolver) -> Self {
        self.fields
            .entry(Name::new(type_name))
            .or_default()
            .insert(Name::new(field_name), Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn directive(mut self, name: &str, middleware: impl DirectiveMiddleware) -> Self {
        self.directives.insert(Name::new(name), Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn abstract_type<F>(mut self, name: &str, resolver: F) -> Self
    where
        F: Fn(&ParentValue) -> Option<String> + Send + Sync + 'static,
    {
        self.abstract_types.insert(Name::new(name), Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn converter<F>(mut self, leaf_type: &str, converter: F) -> Self
    where
        F: Fn(&OpaqueValue) -> Option<serde_json::Value> + Send + Sync + 'static,
    {
        self.converters.insert(Name::new(leaf_type), Arc::new(converter));
        self
    }

    /// Registers an optimizer applied to every selection set nested below `type_name.field_name`.
    #[must_use]
    pub fn field_optimizer(mut self, type_name: &str, field_name: &str, optimizer: impl SelectionSetOptimizer) -> Self {
        self.field_optimizers
            .entry(Name::new(type_name))
            .or_default()
            .entry(Name::new(field_name))
            .or_default()
            .push(Arc::new(optimizer));
        self
    }

    /// Resolver of a field, falling back to the interfaces of the type, then to the property
    /// resolver.
    pub(crate) fn field_resolver_for(
        &self,
        type_name: &str,
        interfaces: &[Name],
        field_name: &str,
    ) -> Arc<dyn FieldResolver> {
        if field_name == "__typename" {
            return self.typename_resolver.clone();
        }
        std::iter::once(type_name)
            .chain(interfaces.iter().map(Name::as_str))
            .find_map(|name| self.fields.get(name)?.get(field_name))
            .unwrap_or(&self.default_resolver)
            .clone()
    }

    pub(crate) fn directive_middleware(&self, name: &str) -> Option<Arc<dyn DirectiveMiddleware>> {
        self.directives.get(name).cloned()
    }

    pub(crate) fn type_resolver(&self, abstract_type: &str) -> Option<&dyn TypeResolver> {
        self.abstract_types.get(abstract_type).map(AsRef::as_ref)
    }

    pub(crate) fn converter_for(&self, leaf_type: &str) -> Option<&dyn ValueConverter> {
        self.converters.get(leaf_type).map(AsRef::as_ref)
    }

    pub(crate) fn optimizers_below(&self, type_name: &str, field_name: &str) -> &[Arc<dyn SelectionSetOptimizer>] {
        self.field_optimizers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
