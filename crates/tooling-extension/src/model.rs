//! Introspected component and configuration models

use crate::resolver::{
    ConfigurationFactory, ConnectionProvider, TypeKeysResolver, TypeResolver, ValueProvider,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use tooling_declaration::{ComponentKind, ElementId};

/// What a component's resolvers need to operate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverCategory {
    /// Configuration and connection
    Standard,
    /// Configuration only
    ConnectionLess,
    /// Connection only; the configuration is instantiated but not handed over
    ConfigLess,
    /// Nothing; no instance is ever acquired
    ConfigLessConnectionLess,
}

impl ResolverCategory {
    /// Whether a runtime instance must be acquired at all
    #[inline]
    #[must_use]
    pub fn needs_instance(self) -> bool {
        !matches!(self, Self::ConfigLessConnectionLess)
    }

    /// Whether the resolver receives the configuration
    #[inline]
    #[must_use]
    pub fn passes_configuration(self) -> bool {
        matches!(self, Self::Standard | Self::ConnectionLess)
    }

    /// Whether the resolver receives a connection
    #[inline]
    #[must_use]
    pub fn needs_connection(self) -> bool {
        matches!(self, Self::Standard | Self::ConfigLess)
    }
}

/// Parameter of a component type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterModel {
    pub name: String,
    /// Type is resolved dynamically
    #[serde(default)]
    pub dynamic_type: bool,
}

/// Parameter supplying one level of a metadata key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPartModel {
    pub parameter: String,
    pub part_name: String,
}

/// Introspected description of an operation or source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTypeDescriptor {
    pub id: ElementId,
    pub kind: ComponentKind,
    pub category: ResolverCategory,
    /// Accepted configuration types; empty accepts any
    #[serde(default)]
    pub config_types: Vec<ElementId>,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
    /// Metadata key levels, most significant first
    #[serde(default)]
    pub key_parts: Vec<KeyPartModel>,
    #[serde(default)]
    pub metadata_categories: Vec<String>,
    #[serde(default)]
    pub dynamic_output: bool,
    #[serde(default)]
    pub dynamic_attributes: bool,
}

impl ComponentTypeDescriptor {
    /// Describe an operation
    #[must_use]
    pub fn operation(id: ElementId, category: ResolverCategory) -> Self {
        Self::new(id, ComponentKind::Operation, category)
    }

    /// Describe a source
    #[must_use]
    pub fn source(id: ElementId, category: ResolverCategory) -> Self {
        Self::new(id, ComponentKind::Source, category)
    }

    fn new(id: ElementId, kind: ComponentKind, category: ResolverCategory) -> Self {
        Self {
            id,
            kind,
            category,
            config_types: Vec::new(),
            parameters: Vec::new(),
            key_parts: Vec::new(),
            metadata_categories: Vec::new(),
            dynamic_output: false,
            dynamic_attributes: false,
        }
    }

    /// Accept a configuration type
    #[inline]
    #[must_use]
    pub fn with_config_type(mut self, config_type: ElementId) -> Self {
        self.config_types.push(config_type);
        self
    }

    /// With statically typed parameter
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterModel {
            name: name.into(),
            dynamic_type: false,
        });
        self
    }

    /// With dynamically typed parameter
    #[inline]
    #[must_use]
    pub fn with_dynamic_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterModel {
            name: name.into(),
            dynamic_type: true,
        });
        self
    }

    /// With metadata key level, after the existing ones
    #[inline]
    #[must_use]
    pub fn with_key_part(mut self, parameter: impl Into<String>, part_name: impl Into<String>) -> Self {
        self.key_parts.push(KeyPartModel {
            parameter: parameter.into(),
            part_name: part_name.into(),
        });
        self
    }

    /// With metadata category
    #[inline]
    #[must_use]
    pub fn with_metadata_category(mut self, category: impl Into<String>) -> Self {
        self.metadata_categories.push(category.into());
        self
    }

    /// Output payload is typed dynamically
    #[inline]
    #[must_use]
    pub fn with_dynamic_output(mut self) -> Self {
        self.dynamic_output = true;
        self
    }

    /// Output attributes are typed dynamically
    #[inline]
    #[must_use]
    pub fn with_dynamic_attributes(mut self) -> Self {
        self.dynamic_attributes = true;
        self
    }

    /// Look up a parameter model
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterModel> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Key part whose level is named `part_name`
    #[must_use]
    pub fn key_part(&self, part_name: &str) -> Option<&KeyPartModel> {
        self.key_parts.iter().find(|k| k.part_name == part_name)
    }

    /// Whether `config_type` may back this component
    #[must_use]
    pub fn accepts_config_type(&self, config_type: &ElementId) -> bool {
        self.config_types.is_empty() || self.config_types.contains(config_type)
    }
}

/// Configuration type and its factory
#[derive(Clone)]
pub struct ConfigurationModel {
    pub element_type: ElementId,
    /// Accepted connection types; empty accepts any
    pub connection_types: Vec<ElementId>,
    pub factory: Arc<dyn ConfigurationFactory>,
}

impl ConfigurationModel {
    /// Create configuration model
    #[must_use]
    pub fn new(element_type: ElementId, factory: Arc<dyn ConfigurationFactory>) -> Self {
        Self {
            element_type,
            connection_types: Vec::new(),
            factory,
        }
    }

    /// Accept a connection type
    #[inline]
    #[must_use]
    pub fn with_connection_type(mut self, connection_type: ElementId) -> Self {
        self.connection_types.push(connection_type);
        self
    }

    /// Whether `connection_type` may be embedded
    #[must_use]
    pub fn accepts_connection_type(&self, connection_type: &ElementId) -> bool {
        self.connection_types.is_empty() || self.connection_types.contains(connection_type)
    }
}

impl Debug for ConfigurationModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationModel")
            .field("element_type", &self.element_type)
            .field("connection_types", &self.connection_types)
            .finish_non_exhaustive()
    }
}

/// Connection type and its provider
#[derive(Clone)]
pub struct ConnectionModel {
    pub element_type: ElementId,
    pub provider: Arc<dyn ConnectionProvider>,
}

impl ConnectionModel {
    /// Create connection model
    #[must_use]
    pub fn new(element_type: ElementId, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            element_type,
            provider,
        }
    }
}

impl Debug for ConnectionModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionModel")
            .field("element_type", &self.element_type)
            .finish_non_exhaustive()
    }
}

/// Resolver capabilities of one component type
#[derive(Clone, Default)]
pub struct ResolverSet {
    pub key_resolvers: Vec<Arc<dyn TypeKeysResolver>>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
    /// Value providers by parameter name
    pub value_providers: IndexMap<String, Arc<dyn ValueProvider>>,
}

impl ResolverSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With key resolver
    #[inline]
    #[must_use]
    pub fn with_key_resolver(mut self, resolver: Arc<dyn TypeKeysResolver>) -> Self {
        self.key_resolvers.push(resolver);
        self
    }

    /// With type resolver, replacing any previous one
    #[inline]
    #[must_use]
    pub fn with_type_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.type_resolver = Some(resolver);
        self
    }

    /// With value provider for a parameter
    #[inline]
    #[must_use]
    pub fn with_value_provider(mut self, parameter: impl Into<String>, provider: Arc<dyn ValueProvider>) -> Self {
        self.value_providers.insert(parameter.into(), provider);
        self
    }

    /// Key resolver for a category
    #[must_use]
    pub fn key_resolver(&self, category: &str) -> Option<&Arc<dyn TypeKeysResolver>> {
        self.key_resolvers.iter().find(|r| r.category() == category)
    }

    /// Value provider for a parameter
    #[must_use]
    pub fn value_provider(&self, parameter: &str) -> Option<&Arc<dyn ValueProvider>> {
        self.value_providers.get(parameter)
    }

    /// Check if no resolver is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_resolvers.is_empty() && self.type_resolver.is_none() && self.value_providers.is_empty()
    }

    /// Names of every registered resolver
    #[must_use]
    pub fn resolver_ids(&self) -> Vec<String> {
        let keys = self.key_resolvers.iter().map(|r| r.resolver_name().to_string());
        let types = self.type_resolver.iter().map(|r| r.resolver_name().to_string());
        let values = self.value_providers.values().map(|p| p.provider_name().to_string());
        keys.chain(types).chain(values).collect()
    }
}

impl Debug for ResolverSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverSet")
            .field("resolvers", &self.resolver_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_requirements() {
        assert!(ResolverCategory::Standard.needs_connection());
        assert!(ResolverCategory::Standard.passes_configuration());
        assert!(!ResolverCategory::ConnectionLess.needs_connection());
        assert!(ResolverCategory::ConfigLess.needs_instance());
        assert!(!ResolverCategory::ConfigLess.passes_configuration());
        assert!(!ResolverCategory::ConfigLessConnectionLess.needs_instance());
    }

    #[test]
    fn empty_config_types_accept_anything() {
        let op = ComponentTypeDescriptor::operation(
            ElementId::new("tooling", "op"),
            ResolverCategory::Standard,
        );
        assert!(op.accepts_config_type(&ElementId::new("other", "config")));

        let op = op.with_config_type(ElementId::new("tooling", "config"));
        assert!(op.accepts_config_type(&ElementId::new("tooling", "config")));
        assert!(!op.accepts_config_type(&ElementId::new("other", "config")));
    }

    #[test]
    fn key_parts_keep_declaration_order() {
        let op = ComponentTypeDescriptor::operation(
            ElementId::new("tooling", "op"),
            ResolverCategory::ConnectionLess,
        )
        .with_key_part("continent", "continent")
        .with_key_part("country", "country");
        let parts: Vec<&str> = op.key_parts.iter().map(|k| k.part_name.as_str()).collect();
        assert_eq!(parts, vec!["continent", "country"]);
        assert!(op.key_part("country").is_some());
        assert!(op.key_part("city").is_none());
    }
}
