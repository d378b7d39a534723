//! Component repository
//!
//! Resolves declarations against the [`ExtensionRegistry`]: which component
//! type applies, which configuration backs it, and which resolvers it has.

use crate::error::RepositoryError;
use crate::model::{
    ComponentTypeDescriptor, ConfigurationModel, ConnectionModel, ResolverCategory, ResolverSet,
};
use crate::registry::ExtensionRegistry;
use std::sync::Arc;
use tooling_declaration::{
    ArtifactDeclaration, ComponentElementDeclaration, ElementId, GlobalElementDeclaration,
    GlobalElementKind, Parameters,
};

/// Configuration backing a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBinding {
    pub name: String,
    pub element_type: ElementId,
}

/// Fully typed view of a component declaration
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub component_type: Arc<ComponentTypeDescriptor>,
    pub category: ResolverCategory,
    /// Configuration to acquire; `None` when the category needs no instance
    pub config: Option<ConfigBinding>,
    pub resolvers: Arc<ResolverSet>,
    /// Parameters read by the component's value providers
    pub acting_parameters: Vec<String>,
    pub resolver_ids: Vec<String>,
}

/// Connection half of a [`ConfigurationBinding`]
#[derive(Debug, Clone)]
pub struct ConnectionBinding {
    pub name: String,
    pub model: ConnectionModel,
    pub parameters: Parameters,
}

/// What the instance cache needs to build one runtime instance
#[derive(Debug, Clone)]
pub struct ConfigurationBinding {
    pub name: String,
    pub model: ConfigurationModel,
    pub parameters: Parameters,
    pub connection: Option<ConnectionBinding>,
}

/// Resolves declarations of one artifact
#[derive(Debug, Clone)]
pub struct ComponentRepository {
    registry: Arc<ExtensionRegistry>,
    artifact: Arc<ArtifactDeclaration>,
}

impl ComponentRepository {
    /// Create repository over a registry and an artifact
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<ExtensionRegistry>, artifact: Arc<ArtifactDeclaration>) -> Self {
        Self { registry, artifact }
    }

    /// Registry backing this repository
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Artifact backing this repository
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &ArtifactDeclaration {
        &self.artifact
    }

    /// Describe a component declaration
    ///
    /// # Errors
    /// Returns an error if the declaration is malformed, the component type is
    /// unknown, or its configuration reference does not fit its category
    pub fn describe(
        &self,
        component: &ComponentElementDeclaration,
    ) -> Result<ComponentDescriptor, RepositoryError> {
        component.validate()?;

        let registered = self
            .registry
            .component(&component.element_type)
            .filter(|r| r.descriptor.kind == component.kind)
            .ok_or_else(|| RepositoryError::ComponentNotFound(component.element_type.clone()))?;
        let component_type = Arc::clone(&registered.descriptor);
        let category = component_type.category;

        let config = if category.needs_instance() {
            let name = component.config_ref.as_deref().ok_or_else(|| {
                RepositoryError::MissingConfigReference {
                    component: component_type.id.clone(),
                }
            })?;
            Some(self.bind_configuration(&component_type, name)?)
        } else {
            // Checked against the artifact, never acquired
            if let Some(name) = &component.config_ref {
                self.configuration_element(name)?;
                tracing::debug!(
                    component = %component_type.id,
                    config = %name,
                    "component needs no configuration, reference not acquired"
                );
            }
            None
        };

        let resolvers = Arc::clone(&registered.resolvers);
        let mut acting_parameters: Vec<String> = Vec::new();
        for provider in resolvers.value_providers.values() {
            for name in provider.acting_parameters() {
                if !acting_parameters.contains(&name) {
                    acting_parameters.push(name);
                }
            }
        }

        Ok(ComponentDescriptor {
            resolver_ids: resolvers.resolver_ids(),
            component_type,
            category,
            config,
            resolvers,
            acting_parameters,
        })
    }

    fn bind_configuration(
        &self,
        component_type: &ComponentTypeDescriptor,
        name: &str,
    ) -> Result<ConfigBinding, RepositoryError> {
        let element = self.configuration_element(name)?;
        if !component_type.accepts_config_type(&element.element_type) {
            return Err(RepositoryError::IncompatibleConfiguration {
                name: name.to_string(),
                reason: format!(
                    "type '{}' cannot back component '{}'",
                    element.element_type, component_type.id
                ),
            });
        }
        if self.registry.configuration_type(&element.element_type).is_none() {
            return Err(RepositoryError::ConfigurationTypeNotFound(
                element.element_type.clone(),
            ));
        }
        if component_type.category.needs_connection() && element.connection.is_none() {
            return Err(RepositoryError::NoConnection(name.to_string()));
        }
        Ok(ConfigBinding {
            name: name.to_string(),
            element_type: element.element_type.clone(),
        })
    }

    /// Everything needed to instantiate a named configuration
    ///
    /// # Errors
    /// Returns an error if the configuration is not declared, is declared as a
    /// connection, or uses an unregistered configuration or connection type
    pub fn describe_configuration(&self, name: &str) -> Result<ConfigurationBinding, RepositoryError> {
        let element = self.configuration_element(name)?;
        let model = self
            .registry
            .configuration_type(&element.element_type)
            .cloned()
            .ok_or_else(|| RepositoryError::ConfigurationTypeNotFound(element.element_type.clone()))?;

        let connection = match element.connection_element() {
            Some(conn) => {
                let conn_model = self
                    .registry
                    .connection_type(&conn.element_type)
                    .cloned()
                    .ok_or_else(|| RepositoryError::ConnectionTypeNotFound(conn.element_type.clone()))?;
                if !model.accepts_connection_type(&conn.element_type) {
                    return Err(RepositoryError::IncompatibleConfiguration {
                        name: name.to_string(),
                        reason: format!("connection type '{}' is not accepted", conn.element_type),
                    });
                }
                Some(ConnectionBinding {
                    name: conn.name.clone(),
                    model: conn_model,
                    parameters: conn.parameters.clone(),
                })
            }
            None => None,
        };

        Ok(ConfigurationBinding {
            name: element.name.clone(),
            model,
            parameters: element.parameters.clone(),
            connection,
        })
    }

    fn configuration_element(&self, name: &str) -> Result<&GlobalElementDeclaration, RepositoryError> {
        let element = self
            .artifact
            .global_element(name)
            .ok_or_else(|| RepositoryError::ConfigurationNotFound(name.to_string()))?;
        if element.kind != GlobalElementKind::Configuration {
            return Err(RepositoryError::IncompatibleConfiguration {
                name: name.to_string(),
                reason: format!("declared as a {}", element.kind),
            });
        }
        Ok(element)
    }
}
