//! In-memory dependency collaborators

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tooling_extension::{
    BundleDependency, ClasspathEntry, DependencyError, DependencyResolver, ExtensionLoader,
    ExtensionModel,
};

/// Maps dependency coordinates to locations and locations to extension models
#[derive(Default)]
pub struct InMemoryBundleRepository {
    bundles: RwLock<HashMap<PathBuf, Arc<dyn ExtensionModel>>>,
}

impl InMemoryBundleRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Location a dependency resolves to
    #[must_use]
    pub fn location_of(dependency: &BundleDependency) -> PathBuf {
        PathBuf::from("repository")
            .join(dependency.group_id.replace('.', "/"))
            .join(&dependency.artifact_id)
            .join(&dependency.version)
            .join(format!(
                "{}-{}-{}.{}",
                dependency.artifact_id, dependency.version, dependency.classifier, dependency.kind
            ))
    }

    /// Publish an extension under the given coordinates
    pub fn publish(&self, dependency: &BundleDependency, extension: Arc<dyn ExtensionModel>) {
        self.bundles.write().insert(Self::location_of(dependency), extension);
    }
}

#[async_trait]
impl DependencyResolver for InMemoryBundleRepository {
    async fn resolve_dependency(
        &self,
        dependency: &BundleDependency,
    ) -> Result<ClasspathEntry, DependencyError> {
        let location = Self::location_of(dependency);
        if !self.bundles.read().contains_key(&location) {
            return Err(DependencyError::NotFound(dependency.to_string()));
        }
        Ok(ClasspathEntry {
            dependency: dependency.clone(),
            location,
        })
    }
}

#[async_trait]
impl ExtensionLoader for InMemoryBundleRepository {
    async fn load(&self, entry: &ClasspathEntry) -> Result<Arc<dyn ExtensionModel>, DependencyError> {
        self.bundles
            .read()
            .get(&entry.location)
            .cloned()
            .ok_or_else(|| DependencyError::NotAnExtension(entry.location.display().to_string()))
    }
}
