//! Artifact/dependency collaborator
//!
//! Dependency coordinates declared for a session are resolved to classpath
//! entries and loaded into extension models by external collaborators.

use crate::error::DependencyError;
use crate::extension::ExtensionModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

fn default_classifier() -> String {
    "mule-plugin".to_string()
}

fn default_kind() -> String {
    "jar".to_string()
}

/// Coordinates of an extra bundle made available to a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default = "default_classifier")]
    pub classifier: String,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
}

impl BundleDependency {
    /// Plugin dependency with default classifier and type
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: default_classifier(),
            kind: default_kind(),
        }
    }

    /// With classifier
    #[inline]
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    /// With packaging type
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

impl Display for BundleDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.classifier, self.kind
        )
    }
}

/// Resolved dependency location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathEntry {
    pub dependency: BundleDependency,
    pub location: PathBuf,
}

/// Resolves dependency coordinates
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Locate a dependency
    async fn resolve_dependency(
        &self,
        dependency: &BundleDependency,
    ) -> Result<ClasspathEntry, DependencyError>;
}

/// Turns a resolved dependency into an extension model
#[async_trait]
pub trait ExtensionLoader: Send + Sync {
    /// Load the extension packaged at `entry`
    async fn load(&self, entry: &ClasspathEntry) -> Result<Arc<dyn ExtensionModel>, DependencyError>;
}
