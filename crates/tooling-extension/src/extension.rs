//! Extension model collaborator
//!
//! An [`ExtensionModel`] is what loading a packaged connector yields: its
//! component types, configuration and connection types, and the resolvers
//! attached to each component. [`ExtensionBuilder`] assembles one in memory.

use crate::model::{ComponentTypeDescriptor, ConfigurationModel, ConnectionModel, ResolverSet};
use indexmap::IndexMap;
use std::sync::Arc;
use tooling_declaration::ElementId;

/// Introspected extension
pub trait ExtensionModel: Send + Sync {
    /// Extension name
    fn name(&self) -> &str;

    /// Every component type, in declaration order
    fn component_types(&self) -> Vec<Arc<ComponentTypeDescriptor>>;

    /// Component type by id
    fn lookup_component_type(&self, id: &ElementId) -> Option<Arc<ComponentTypeDescriptor>>;

    /// Resolver capabilities of a component type
    fn resolvers_for(&self, component: &ComponentTypeDescriptor) -> ResolverSet;

    /// Configuration types
    fn configuration_types(&self) -> Vec<ConfigurationModel>;

    /// Connection types
    fn connection_types(&self) -> Vec<ConnectionModel>;
}

/// Builder for an in-memory [`ExtensionModel`]
#[derive(Debug)]
pub struct ExtensionBuilder {
    name: String,
    components: IndexMap<ElementId, (Arc<ComponentTypeDescriptor>, ResolverSet)>,
    configurations: Vec<ConfigurationModel>,
    connections: Vec<ConnectionModel>,
}

impl ExtensionBuilder {
    /// Start an extension
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: IndexMap::new(),
            configurations: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// With component type and its resolvers; a repeated id replaces the earlier one
    #[must_use]
    pub fn with_component(mut self, component: ComponentTypeDescriptor, resolvers: ResolverSet) -> Self {
        self.components
            .insert(component.id.clone(), (Arc::new(component), resolvers));
        self
    }

    /// With configuration type
    #[inline]
    #[must_use]
    pub fn with_configuration(mut self, configuration: ConfigurationModel) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// With connection type
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionModel) -> Self {
        self.connections.push(connection);
        self
    }

    /// Finish the extension
    #[must_use]
    pub fn build(self) -> InMemoryExtension {
        InMemoryExtension {
            name: self.name,
            components: self.components,
            configurations: self.configurations,
            connections: self.connections,
        }
    }
}

/// Extension assembled with [`ExtensionBuilder`]
#[derive(Debug)]
pub struct InMemoryExtension {
    name: String,
    components: IndexMap<ElementId, (Arc<ComponentTypeDescriptor>, ResolverSet)>,
    configurations: Vec<ConfigurationModel>,
    connections: Vec<ConnectionModel>,
}

impl ExtensionModel for InMemoryExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn component_types(&self) -> Vec<Arc<ComponentTypeDescriptor>> {
        self.components.values().map(|(c, _)| Arc::clone(c)).collect()
    }

    fn lookup_component_type(&self, id: &ElementId) -> Option<Arc<ComponentTypeDescriptor>> {
        self.components.get(id).map(|(c, _)| Arc::clone(c))
    }

    fn resolvers_for(&self, component: &ComponentTypeDescriptor) -> ResolverSet {
        self.components
            .get(&component.id)
            .map(|(_, resolvers)| resolvers.clone())
            .unwrap_or_default()
    }

    fn configuration_types(&self) -> Vec<ConfigurationModel> {
        self.configurations.clone()
    }

    fn connection_types(&self) -> Vec<ConnectionModel> {
        self.connections.clone()
    }
}
