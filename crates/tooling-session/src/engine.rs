//! Resolution engine
//!
//! Every operation has the same shape: describe the component, acquire the
//! runtime instance its category calls for, invoke the resolver and wrap the
//! outcome. Resolver errors and panics become failure results; results that
//! arrive after their instance was released are replaced by `SESSION_CLOSED`.

use crate::cache::InstanceCache;
use crate::instance::RuntimeInstance;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tooling_declaration::{ComponentElementDeclaration, ParameterValue};
use tooling_extension::{
    ComponentDescriptor, ComponentRepository, ResolutionContext, ResolverError, TypeKeysResolver,
    TypeResolver,
};
use tooling_metadata::{
    ConnectionValidationResult, FailureReason, KeyLevelSource, KeyTreeError, KeyTreeResolver,
    MetadataKey, MetadataKeyValue, MetadataKeysContainer, MetadataResult, MetadataType,
    MetadataTypesContainer, PartialKey, ResolutionFailure, Value, ValueResult,
};

/// Which dynamic type is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeTarget<'a> {
    Input(&'a str),
    Output,
    Attributes,
}

impl Display for TypeTarget<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(parameter) => write!(f, "input parameter '{parameter}'"),
            Self::Output => f.write_str("output"),
            Self::Attributes => f.write_str("output attributes"),
        }
    }
}

/// Dispatches resolution requests to component resolvers
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    repository: ComponentRepository,
    cache: Arc<InstanceCache>,
}

impl ResolutionEngine {
    /// Create engine over a repository and an instance cache
    #[inline]
    #[must_use]
    pub fn new(repository: ComponentRepository, cache: Arc<InstanceCache>) -> Self {
        Self { repository, cache }
    }

    /// Component repository
    #[inline]
    #[must_use]
    pub fn repository(&self) -> &ComponentRepository {
        &self.repository
    }

    /// Connect (if needed) and validate the connection of a configuration
    pub async fn test_connection(&self, config_name: &str) -> ConnectionValidationResult {
        match guarded(self.try_test_connection(config_name)).await {
            Ok(()) => ConnectionValidationResult::success(),
            Err(failure) => ConnectionValidationResult::failed(failure),
        }
    }

    async fn try_test_connection(&self, config_name: &str) -> Result<(), ResolutionFailure> {
        let binding = self.repository.describe_configuration(config_name)?;
        if binding.connection.is_none() {
            return Err(ResolutionFailure::new(
                FailureReason::InvalidConfigReference,
                format!("configuration '{config_name}' declares no connection"),
            ));
        }

        let instance = self.cache.get_or_create(config_name).await?;
        let outcome = validate_connection(&instance).await;
        settle(Some(&instance), outcome)
    }

    /// Legal values of one parameter
    pub async fn get_values(&self, component: &ComponentElementDeclaration, parameter: &str) -> ValueResult {
        guarded(self.try_get_values(component, parameter)).await.into()
    }

    async fn try_get_values(
        &self,
        component: &ComponentElementDeclaration,
        parameter: &str,
    ) -> Result<Vec<Value>, ResolutionFailure> {
        let descriptor = self.repository.describe(component)?;
        let provider = descriptor
            .resolvers
            .value_provider(parameter)
            .cloned()
            .ok_or_else(|| {
                ResolutionFailure::new(
                    FailureReason::ComponentNotFound,
                    format!(
                        "no value provider for parameter '{parameter}' of '{}'",
                        descriptor.component_type.id
                    ),
                )
            })?;

        let acting = provider
            .acting_parameters()
            .into_iter()
            .filter_map(|name| component.parameter(&name).cloned().map(|value| (name, value)))
            .collect();
        let (ctx, instance) = self.context(&descriptor, acting).await?;

        tracing::debug!(provider = provider.provider_name(), parameter, "resolving values");
        let outcome = provider.resolve(&ctx).await.map_err(ResolutionFailure::from);
        let values = settle(instance.as_deref(), outcome)?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = values.iter().find(|v| !seen.insert(v.id.as_str())) {
            return Err(ResolutionFailure::new(
                FailureReason::ResolverContractViolation,
                format!(
                    "value provider '{}' returned duplicate id '{}'",
                    provider.provider_name(),
                    duplicate.id
                ),
            ));
        }
        Ok(values)
    }

    /// Metadata key trees by category
    pub async fn get_metadata_keys(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataKeysContainer> {
        guarded(self.try_get_metadata_keys(component)).await.into()
    }

    async fn try_get_metadata_keys(
        &self,
        component: &ComponentElementDeclaration,
    ) -> Result<MetadataKeysContainer, ResolutionFailure> {
        let descriptor = self.repository.describe(component)?;
        let mut categories = descriptor.component_type.metadata_categories.clone();
        for resolver in &descriptor.resolvers.key_resolvers {
            let category = resolver.category().to_string();
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        if categories.is_empty() {
            return Err(ResolutionFailure::new(
                FailureReason::NoDynamicKeysAvailable,
                format!("component '{}' has no metadata keys", descriptor.component_type.id),
            ));
        }

        if descriptor.resolvers.key_resolvers.is_empty() {
            let mut container = MetadataKeysContainer::new();
            for category in categories {
                container.insert(category, Vec::new());
            }
            return Ok(container);
        }

        let (ctx, instance) = self
            .context(&descriptor, declared_parameters(component))
            .await?;
        let outcome = collect_keys(&descriptor, component, &categories, &ctx).await;
        settle(instance.as_deref(), outcome)
    }

    /// Every dynamic type of a component
    pub async fn get_metadata_types(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataTypesContainer> {
        guarded(self.try_get_metadata_types(component)).await.into()
    }

    async fn try_get_metadata_types(
        &self,
        component: &ComponentElementDeclaration,
    ) -> Result<MetadataTypesContainer, ResolutionFailure> {
        let descriptor = self.repository.describe(component)?;
        let resolver = type_resolver(&descriptor)?;
        let key = key_value(&descriptor, component)?;
        let (ctx, instance) = self
            .context(&descriptor, declared_parameters(component))
            .await?;
        let outcome = collect_types(&descriptor, resolver.as_ref(), &ctx, &key).await;
        settle(instance.as_deref(), outcome)
    }

    /// Dynamic type of one input parameter
    pub async fn input_metadata(
        &self,
        component: &ComponentElementDeclaration,
        parameter: &str,
    ) -> MetadataResult<MetadataType> {
        guarded(self.resolve_type(component, TypeTarget::Input(parameter)))
            .await
            .into()
    }

    /// Dynamic type of the output payload
    pub async fn output_metadata(&self, component: &ComponentElementDeclaration) -> MetadataResult<MetadataType> {
        guarded(self.resolve_type(component, TypeTarget::Output)).await.into()
    }

    /// Dynamic type of the output attributes
    pub async fn output_attributes_metadata(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataType> {
        guarded(self.resolve_type(component, TypeTarget::Attributes))
            .await
            .into()
    }

    async fn resolve_type(
        &self,
        component: &ComponentElementDeclaration,
        target: TypeTarget<'_>,
    ) -> Result<MetadataType, ResolutionFailure> {
        let descriptor = self.repository.describe(component)?;
        let component_type = &descriptor.component_type;
        let dynamic = match target {
            TypeTarget::Input(parameter) => component_type
                .parameter(parameter)
                .is_some_and(|p| p.dynamic_type),
            TypeTarget::Output => component_type.dynamic_output,
            TypeTarget::Attributes => component_type.dynamic_attributes,
        };
        if !dynamic {
            return Err(no_dynamic_type(&descriptor, target));
        }

        let resolver = type_resolver(&descriptor)?;
        let key = key_value(&descriptor, component)?;
        let (ctx, instance) = self
            .context(&descriptor, declared_parameters(component))
            .await?;
        let outcome = resolve_target(resolver.as_ref(), &ctx, &key, target).await;
        settle(instance.as_deref(), outcome)?.ok_or_else(|| no_dynamic_type(&descriptor, target))
    }

    /// Build the resolver context, acquiring only what the category allows
    async fn context(
        &self,
        descriptor: &ComponentDescriptor,
        acting: Vec<(String, ParameterValue)>,
    ) -> Result<(ResolutionContext, Option<Arc<RuntimeInstance>>), ResolutionFailure> {
        let ctx = acting
            .into_iter()
            .fold(ResolutionContext::new(), |ctx, (name, value)| {
                ctx.with_acting_parameter(name, value)
            });
        let Some(binding) = &descriptor.config else {
            return Ok((ctx, None));
        };

        let instance = self.cache.get_or_create(&binding.name).await?;
        let mut ctx = ctx.with_config_name(binding.name.clone());
        if descriptor.category.passes_configuration() {
            ctx = ctx.with_configuration(instance.configuration());
        }
        if descriptor.category.needs_connection() {
            ctx = ctx.with_connection(instance.connection().await?);
        }
        if instance.is_disposed() {
            return Err(ResolutionFailure::session_closed());
        }
        Ok((ctx, Some(instance)))
    }
}

/// Adapts a key resolver to one level of the key tree walk
struct LevelSource<'a> {
    resolver: &'a dyn TypeKeysResolver,
    ctx: &'a ResolutionContext,
}

#[async_trait]
impl KeyLevelSource for LevelSource<'_> {
    type Error = ResolverError;

    async fn keys_at(&self, prefix: &[String]) -> Result<Vec<MetadataKey>, ResolverError> {
        self.resolver.level_keys(self.ctx, prefix).await
    }
}

async fn validate_connection(instance: &RuntimeInstance) -> Result<(), ResolutionFailure> {
    let connection = instance.connection().await?;
    if let Some(provider) = instance.connection_provider() {
        provider
            .validate(connection.as_ref())
            .await
            .map_err(|e| ResolutionFailure::from_error(FailureReason::ConnectionFailure, &e))?;
    }
    Ok(())
}

async fn collect_keys(
    descriptor: &ComponentDescriptor,
    component: &ComponentElementDeclaration,
    categories: &[String],
    ctx: &ResolutionContext,
) -> Result<MetadataKeysContainer, ResolutionFailure> {
    let mut container = MetadataKeysContainer::new();
    for category in categories {
        let keys = match descriptor.resolvers.key_resolver(category) {
            Some(resolver) => resolve_key_tree(descriptor, component, resolver.as_ref(), ctx).await?,
            None => Vec::new(),
        };
        container.insert(category.clone(), keys);
    }
    Ok(container)
}

async fn resolve_key_tree(
    descriptor: &ComponentDescriptor,
    component: &ComponentElementDeclaration,
    resolver: &dyn TypeKeysResolver,
    ctx: &ResolutionContext,
) -> Result<Vec<MetadataKey>, ResolutionFailure> {
    let parts = resolver.parts();
    let partial = PartialKey::new(
        parts
            .iter()
            .map(|part| {
                descriptor
                    .component_type
                    .key_part(part)
                    .and_then(|kp| component.parameter(&kp.parameter))
                    .and_then(ParameterValue::to_text)
            })
            .collect(),
    );

    tracing::debug!(
        resolver = resolver.resolver_name(),
        category = resolver.category(),
        "resolving metadata keys"
    );
    let source = LevelSource { resolver, ctx };
    KeyTreeResolver::new(&parts, &source)
        .resolve(&partial)
        .await
        .map_err(|e| key_tree_failure(&e))
}

fn key_tree_failure(error: &KeyTreeError<ResolverError>) -> ResolutionFailure {
    let reason = match error {
        KeyTreeError::UnknownKey { .. } => FailureReason::InvalidMetadataKey,
        KeyTreeError::Level { source, .. } => source.reason(),
        KeyTreeError::Gap { .. }
        | KeyTreeError::TooManyLevels { .. }
        | KeyTreeError::DuplicateKey { .. }
        | KeyTreeError::AmbiguousKey { .. } => FailureReason::ResolverContractViolation,
    };
    ResolutionFailure::from_error(reason, error)
}

async fn collect_types(
    descriptor: &ComponentDescriptor,
    resolver: &dyn TypeResolver,
    ctx: &ResolutionContext,
    key: &MetadataKeyValue,
) -> Result<MetadataTypesContainer, ResolutionFailure> {
    let component_type = &descriptor.component_type;
    let mut container = MetadataTypesContainer::new();
    for parameter in component_type.parameters.iter().filter(|p| p.dynamic_type) {
        if let Some(ty) = resolve_target(resolver, ctx, key, TypeTarget::Input(&parameter.name)).await? {
            container.insert_input(parameter.name.clone(), ty);
        }
    }
    if component_type.dynamic_output {
        if let Some(ty) = resolve_target(resolver, ctx, key, TypeTarget::Output).await? {
            container.set_output(ty);
        }
    }
    if component_type.dynamic_attributes {
        if let Some(ty) = resolve_target(resolver, ctx, key, TypeTarget::Attributes).await? {
            container.set_output_attributes(ty);
        }
    }
    Ok(container)
}

async fn resolve_target(
    resolver: &dyn TypeResolver,
    ctx: &ResolutionContext,
    key: &MetadataKeyValue,
    target: TypeTarget<'_>,
) -> Result<Option<MetadataType>, ResolutionFailure> {
    tracing::debug!(
        resolver = resolver.resolver_name(),
        requested = %target,
        key = %key.joined(),
        "resolving metadata type"
    );
    let resolved = match target {
        TypeTarget::Input(parameter) => resolver.input_type(ctx, key, parameter).await,
        TypeTarget::Output => resolver.output_type(ctx, key).await,
        TypeTarget::Attributes => resolver.attributes_type(ctx, key).await,
    };
    resolved.map_err(ResolutionFailure::from)
}

fn type_resolver(descriptor: &ComponentDescriptor) -> Result<Arc<dyn TypeResolver>, ResolutionFailure> {
    descriptor.resolvers.type_resolver.clone().ok_or_else(|| {
        ResolutionFailure::new(
            FailureReason::NoDynamicTypeAvailable,
            format!("component '{}' has no type resolver", descriptor.component_type.id),
        )
    })
}

fn no_dynamic_type(descriptor: &ComponentDescriptor, target: TypeTarget<'_>) -> ResolutionFailure {
    ResolutionFailure::new(
        FailureReason::NoDynamicTypeAvailable,
        format!(
            "component '{}' has no dynamic type for {target}",
            descriptor.component_type.id
        ),
    )
}

/// Complete metadata key from the component's key part parameters
fn key_value(
    descriptor: &ComponentDescriptor,
    component: &ComponentElementDeclaration,
) -> Result<MetadataKeyValue, ResolutionFailure> {
    descriptor
        .component_type
        .key_parts
        .iter()
        .try_fold(MetadataKeyValue::empty(), |key, part| {
            let value = component
                .parameter(&part.parameter)
                .and_then(ParameterValue::to_text)
                .ok_or_else(|| {
                    ResolutionFailure::new(
                        FailureReason::InvalidMetadataKey,
                        format!("missing value for metadata key part '{}'", part.part_name),
                    )
                })?;
            Ok(key.with_part(part.part_name.clone(), value))
        })
}

/// Declared parameter values; the default group shadows named groups
fn declared_parameters(component: &ComponentElementDeclaration) -> Vec<(String, ParameterValue)> {
    let mut seen = HashSet::new();
    component
        .parameters
        .iter()
        .chain(component.groups.iter().flat_map(|g| g.parameters.iter()))
        .filter(|(name, _)| seen.insert(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Discard a result produced against a released instance
fn settle<T>(
    instance: Option<&RuntimeInstance>,
    outcome: Result<T, ResolutionFailure>,
) -> Result<T, ResolutionFailure> {
    match instance {
        Some(instance) if instance.is_disposed() => {
            tracing::debug!(config = instance.config_name(), "discarding result of a released instance");
            Err(ResolutionFailure::session_closed())
        }
        _ => outcome,
    }
}

/// Run an operation, turning a panic into an `UNKNOWN` failure
async fn guarded<T, F>(operation: F) -> Result<T, ResolutionFailure>
where
    F: Future<Output = Result<T, ResolutionFailure>>,
{
    AssertUnwindSafe(operation)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            tracing::warn!(panic = %message, "resolver panicked");
            Err(ResolutionFailure::new(FailureReason::Unknown, "resolver panicked").with_cause(message))
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tooling_declaration::{ElementId, ParameterGroupDeclaration};

    #[tokio::test]
    async fn guarded_turns_panics_into_unknown() {
        let result: Result<(), ResolutionFailure> = guarded(async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        })
        .await;
        let failure = result.unwrap_err();
        assert_eq!(failure.reason, FailureReason::Unknown);
        assert_eq!(failure.cause.as_deref(), Some("kaboom"));
    }

    #[tokio::test]
    async fn guarded_passes_results_through() {
        let ok = guarded(async { Ok::<_, ResolutionFailure>(3) }).await;
        assert_eq!(ok.unwrap(), 3);
    }

    #[test]
    fn default_group_shadows_named_groups() {
        let component = ComponentElementDeclaration::operation(ElementId::new("tooling", "op"))
            .with_parameter("a", "top")
            .with_group(
                ParameterGroupDeclaration::new("group")
                    .with_parameter("a", "grouped")
                    .with_parameter("b", "grouped"),
            );
        let params = declared_parameters(&component);
        assert_eq!(
            params,
            vec![
                ("a".to_string(), ParameterValue::string("top")),
                ("b".to_string(), ParameterValue::string("grouped")),
            ]
        );
    }

    #[test]
    fn key_tree_errors_map_to_reasons() {
        let unknown: KeyTreeError<ResolverError> = KeyTreeError::UnknownKey {
            part: "continent".into(),
            value: "ASIA".into(),
        };
        assert_eq!(key_tree_failure(&unknown).reason, FailureReason::InvalidMetadataKey);

        let gap: KeyTreeError<ResolverError> = KeyTreeError::Gap { level: 2 };
        assert_eq!(key_tree_failure(&gap).reason, FailureReason::ResolverContractViolation);

        let ambiguous: KeyTreeError<ResolverError> = KeyTreeError::AmbiguousKey {
            part: "country".into(),
            value: "usa".into(),
        };
        assert_eq!(key_tree_failure(&ambiguous).reason, FailureReason::ResolverContractViolation);

        let level = KeyTreeError::Level {
            level: 1,
            source: ResolverError::Connection("down".into()),
        };
        let failure = key_tree_failure(&level);
        assert_eq!(failure.reason, FailureReason::ConnectionFailure);
        assert_eq!(failure.cause.as_deref(), Some("connection error: down"));
    }

    proptest! {
        #[test]
        fn declared_parameters_are_unique_and_top_level_wins(
            top in prop::collection::btree_set("[a-e]", 0..5),
            grouped in prop::collection::btree_set("[a-e]", 0..5),
        ) {
            let component = top.iter().fold(
                ComponentElementDeclaration::operation(ElementId::new("tooling", "op")).with_group(
                    grouped.iter().fold(ParameterGroupDeclaration::new("group"), |g, name| {
                        g.with_parameter(name.as_str(), "grouped")
                    }),
                ),
                |c, name| c.with_parameter(name.as_str(), "top"),
            );
            let params = declared_parameters(&component);

            let names: HashSet<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
            prop_assert_eq!(names.len(), params.len());
            prop_assert_eq!(names.len(), top.union(&grouped).count());
            for (name, value) in &params {
                let expected = if top.contains(name) { "top" } else { "grouped" };
                prop_assert_eq!(value.as_str(), Some(expected));
            }
        }
    }
}
