//! Declaration session facade
//!
//! A [`DeclarationSession`] owns the instance cache for one artifact
//! declaration and exposes connection testing, value resolution, metadata key
//! resolution and metadata type resolution. After [`DeclarationSession::dispose`]
//! every operation fails with `SESSION_CLOSED` without touching a resolver.

use crate::cache::{CacheStats, InstanceCache};
use crate::config::SessionConfig;
use crate::engine::ResolutionEngine;
use crate::error::SessionError;
use crate::instance::DeclaredInstanceFactory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Instrument;
use tooling_declaration::{ArtifactDeclaration, ComponentElementDeclaration};
use tooling_extension::{
    BundleDependency, ComponentRepository, DependencyResolver, ExtensionLoader, ExtensionModel,
    ExtensionRegistry,
};
use tooling_metadata::{
    ConnectionValidationResult, MetadataKeysContainer, MetadataResult, MetadataType,
    MetadataTypesContainer, ResolutionFailure, ResolutionResult, ValueResult,
};

/// Builder for [`DeclarationSession`]
#[derive(Default)]
pub struct SessionBuilder {
    artifact: ArtifactDeclaration,
    dependencies: Vec<BundleDependency>,
    dependency_resolver: Option<Arc<dyn DependencyResolver>>,
    extension_loader: Option<Arc<dyn ExtensionLoader>>,
    extensions: Vec<Arc<dyn ExtensionModel>>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create builder with an empty artifact
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With the artifact whose global elements components reference
    #[inline]
    #[must_use]
    pub fn artifact_declaration(mut self, artifact: ArtifactDeclaration) -> Self {
        self.artifact = artifact;
        self
    }

    /// With extra dependency providing an extension
    #[inline]
    #[must_use]
    pub fn add_dependency(mut self, dependency: BundleDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// With collaborator resolving dependency coordinates
    #[inline]
    #[must_use]
    pub fn dependency_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.dependency_resolver = Some(resolver);
        self
    }

    /// With collaborator loading extension models
    #[inline]
    #[must_use]
    pub fn extension_loader(mut self, loader: Arc<dyn ExtensionLoader>) -> Self {
        self.extension_loader = Some(loader);
        self
    }

    /// With an already loaded extension
    #[inline]
    #[must_use]
    pub fn with_extension(mut self, extension: Arc<dyn ExtensionModel>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// With session configuration
    #[inline]
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve dependencies, populate the registry and create the session
    ///
    /// # Errors
    /// Returns an error if the artifact is malformed, a dependency cannot be
    /// resolved or loaded, or two extensions register the same component
    pub async fn build(self) -> Result<DeclarationSession, SessionError> {
        self.artifact.validate()?;

        let mut extensions = self.extensions;
        if !self.dependencies.is_empty() {
            let resolver = self
                .dependency_resolver
                .ok_or(SessionError::MissingCollaborator("dependency resolver"))?;
            let loader = self
                .extension_loader
                .ok_or(SessionError::MissingCollaborator("extension loader"))?;
            for dependency in &self.dependencies {
                tracing::debug!(dependency = %dependency, "resolving dependency");
                let entry = resolver.resolve_dependency(dependency).await?;
                extensions.push(loader.load(&entry).await?);
            }
        }

        let registry = ExtensionRegistry::from_models(&extensions)?;
        let repository = ComponentRepository::new(Arc::new(registry), Arc::new(self.artifact));
        let factory = DeclaredInstanceFactory::new(repository.clone())
            .with_validate_on_connect(self.config.validate_on_connect);
        let cache = Arc::new(InstanceCache::new(Arc::new(factory)));

        tracing::info!(
            session = %self.config.name,
            extensions = extensions.len(),
            components = repository.registry().len(),
            "declaration session created"
        );
        Ok(DeclarationSession {
            engine: ResolutionEngine::new(repository, Arc::clone(&cache)),
            cache,
            config: self.config,
            closed: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("artifact", &self.artifact.name)
            .field("dependencies", &self.dependencies)
            .field("extensions", &self.extensions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resolution session over one artifact declaration
///
/// Safe to share between tasks; wrap it in an `Arc`.
#[derive(Debug)]
pub struct DeclarationSession {
    engine: ResolutionEngine,
    cache: Arc<InstanceCache>,
    config: SessionConfig,
    closed: AtomicBool,
}

impl DeclarationSession {
    /// Start building a session
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the session has been disposed
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Instance cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Test the connection of a configuration
    pub async fn test_connection(&self, config_name: &str) -> ConnectionValidationResult {
        let span = tracing::info_span!("test_connection", session = %self.config.name, config = %config_name);
        if self.is_disposed() {
            return ConnectionValidationResult::failed(ResolutionFailure::session_closed());
        }
        self.engine.test_connection(config_name).instrument(span).await
    }

    /// Legal values of a component parameter
    pub async fn get_values(&self, component: &ComponentElementDeclaration, parameter: &str) -> ValueResult {
        let span = self.span("get_values", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => self.engine.get_values(component, parameter).instrument(span).await,
        }
    }

    /// Metadata keys of a component, by category
    pub async fn get_metadata_keys(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataKeysContainer> {
        let span = self.span("get_metadata_keys", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => self.engine.get_metadata_keys(component).instrument(span).await,
        }
    }

    /// Every dynamic type of a component
    pub async fn get_metadata_types(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataTypesContainer> {
        let span = self.span("get_metadata_types", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => self.engine.get_metadata_types(component).instrument(span).await,
        }
    }

    /// Dynamic type of one input parameter
    pub async fn input_metadata(
        &self,
        component: &ComponentElementDeclaration,
        parameter: &str,
    ) -> MetadataResult<MetadataType> {
        let span = self.span("input_metadata", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => self.engine.input_metadata(component, parameter).instrument(span).await,
        }
    }

    /// Dynamic type of the output payload
    pub async fn output_metadata(&self, component: &ComponentElementDeclaration) -> MetadataResult<MetadataType> {
        let span = self.span("output_metadata", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => self.engine.output_metadata(component).instrument(span).await,
        }
    }

    /// Dynamic type of the output attributes
    pub async fn output_attributes_metadata(
        &self,
        component: &ComponentElementDeclaration,
    ) -> MetadataResult<MetadataType> {
        let span = self.span("output_attributes_metadata", component);
        match self.closed_result() {
            Some(closed) => closed,
            None => {
                self.engine
                    .output_attributes_metadata(component)
                    .instrument(span)
                    .await
            }
        }
    }

    /// Release the cached instance of a configuration so the next call reconnects
    ///
    /// Returns whether an instance was cached.
    pub async fn invalidate(&self, config_name: &str) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.cache.invalidate(config_name).await
    }

    /// Release every instance and close the session; later calls do nothing
    pub async fn dispose(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.dispose_all().await;
        tracing::info!(session = %self.config.name, "declaration session disposed");
    }

    fn span(&self, operation: &'static str, component: &ComponentElementDeclaration) -> tracing::Span {
        tracing::info_span!(
            "resolve",
            session = %self.config.name,
            operation,
            component = %component.element_type,
        )
    }

    fn closed_result<T>(&self) -> Option<ResolutionResult<T>> {
        self.is_disposed()
            .then(|| ResolutionResult::Failure(ResolutionFailure::session_closed()))
    }
}

impl Drop for DeclarationSession {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::warn!(
                session = %self.config.name,
                "declaration session dropped without dispose, cached instances were not released"
            );
        }
    }
}
