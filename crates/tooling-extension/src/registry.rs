//! Explicit resolver registry
//!
//! Populated once from the loaded [`ExtensionModel`]s when a session is built;
//! resolution never introspects extensions again.

use crate::error::RegistryError;
use crate::extension::ExtensionModel;
use crate::model::{ComponentTypeDescriptor, ConfigurationModel, ConnectionModel, ResolverSet};
use std::collections::HashMap;
use std::sync::Arc;
use tooling_declaration::ElementId;

/// Component type with its resolver capabilities
#[derive(Debug, Clone)]
pub struct RegisteredComponent {
    pub descriptor: Arc<ComponentTypeDescriptor>,
    pub resolvers: Arc<ResolverSet>,
    /// Extension that contributed the component
    pub extension: String,
}

/// Component type id → capabilities, plus configuration and connection types
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<String>,
    components: HashMap<ElementId, RegisteredComponent>,
    configurations: HashMap<ElementId, ConfigurationModel>,
    connections: HashMap<ElementId, ConnectionModel>,
}

impl ExtensionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded extensions
    ///
    /// # Errors
    /// Returns an error if two extensions share a name or a component id
    pub fn from_models(models: &[Arc<dyn ExtensionModel>]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for model in models {
            registry.register(model.as_ref())?;
        }
        Ok(registry)
    }

    /// Register every component, configuration and connection type of an extension
    ///
    /// # Errors
    /// Returns an error if the extension or one of its components is already registered
    pub fn register(&mut self, model: &dyn ExtensionModel) -> Result<(), RegistryError> {
        let name = model.name().to_string();
        if self.extensions.contains(&name) {
            return Err(RegistryError::DuplicateExtension(name));
        }

        let components = model.component_types();
        for descriptor in &components {
            if let Some(existing) = self.components.get(&descriptor.id) {
                return Err(RegistryError::DuplicateComponent {
                    id: descriptor.id.clone(),
                    first: existing.extension.clone(),
                    second: name,
                });
            }
        }

        for descriptor in components {
            let resolvers = model.resolvers_for(&descriptor);
            for parameter in resolvers.value_providers.keys() {
                if descriptor.parameter(parameter).is_none() {
                    tracing::warn!(
                        component = %descriptor.id,
                        parameter = %parameter,
                        "value provider registered for an undeclared parameter"
                    );
                }
            }
            self.components.insert(
                descriptor.id.clone(),
                RegisteredComponent {
                    descriptor,
                    resolvers: Arc::new(resolvers),
                    extension: name.clone(),
                },
            );
        }
        for configuration in model.configuration_types() {
            self.configurations
                .insert(configuration.element_type.clone(), configuration);
        }
        for connection in model.connection_types() {
            self.connections.insert(connection.element_type.clone(), connection);
        }

        tracing::debug!(extension = %name, components = self.components.len(), "extension registered");
        self.extensions.push(name);
        Ok(())
    }

    /// Component type by id
    #[inline]
    #[must_use]
    pub fn component(&self, id: &ElementId) -> Option<&RegisteredComponent> {
        self.components.get(id)
    }

    /// Configuration type by id
    #[inline]
    #[must_use]
    pub fn configuration_type(&self, id: &ElementId) -> Option<&ConfigurationModel> {
        self.configurations.get(id)
    }

    /// Connection type by id
    #[inline]
    #[must_use]
    pub fn connection_type(&self, id: &ElementId) -> Option<&ConnectionModel> {
        self.connections.get(id)
    }

    /// Registered extension names, in registration order
    #[inline]
    #[must_use]
    pub fn extension_names(&self) -> &[String] {
        &self.extensions
    }

    /// Number of registered component types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if no component type is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionBuilder;
    use crate::model::ResolverCategory;

    fn extension(name: &str, components: &[&str]) -> Arc<dyn ExtensionModel> {
        let builder = components.iter().fold(ExtensionBuilder::new(name), |b, c| {
            b.with_component(
                ComponentTypeDescriptor::operation(
                    ElementId::new("tooling", *c),
                    ResolverCategory::ConfigLessConnectionLess,
                ),
                ResolverSet::new(),
            )
        });
        Arc::new(builder.build())
    }

    #[test]
    fn registers_components_from_every_model() {
        let registry =
            ExtensionRegistry::from_models(&[extension("one", &["a", "b"]), extension("two", &["c"])])
                .unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.extension_names(), ["one".to_string(), "two".to_string()]);
        let c = registry.component(&ElementId::new("tooling", "c")).unwrap();
        assert_eq!(c.extension, "two");
    }

    #[test]
    fn duplicate_component_is_rejected() {
        let err = ExtensionRegistry::from_models(&[extension("one", &["a"]), extension("two", &["a"])])
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateComponent { ref first, ref second, .. } if first == "one" && second == "two"
        ));
    }

    #[test]
    fn duplicate_extension_is_rejected() {
        let err = ExtensionRegistry::from_models(&[extension("one", &["a"]), extension("one", &["b"])])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateExtension(ref n) if n == "one"));
    }

    #[test]
    fn empty_registry() {
        let registry = ExtensionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.component(&ElementId::new("tooling", "a")).is_none());
    }
}
