//! Error types for the session layer

use std::sync::Arc;
use tooling_declaration::DeclarationError;
use tooling_extension::{DependencyError, RegistryError, RepositoryError, ResolverError};
use tooling_metadata::{FailureReason, ResolutionFailure};

/// Errors building a session
///
/// Only session construction returns these; operations on a built session
/// report failures through result envelopes.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Artifact declaration failed validation
    #[error("invalid artifact declaration: {0}")]
    InvalidDeclaration(#[from] DeclarationError),

    /// A declared dependency could not be resolved or loaded
    #[error("dependency error: {0}")]
    Dependency(#[from] DependencyError),

    /// Loaded extensions conflict
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Session configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Dependencies were declared without a collaborator to resolve them
    #[error("dependencies declared but no {0} configured")]
    MissingCollaborator(&'static str),
}

/// Errors building a runtime instance
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to create configuration '{name}'")]
    Configuration {
        name: String,
        #[source]
        source: ResolverError,
    },

    #[error("failed to connect '{name}'")]
    Connection {
        name: String,
        #[source]
        source: ResolverError,
    },

    #[error("connection '{name}' is not valid")]
    Validation {
        name: String,
        #[source]
        source: ResolverError,
    },

    #[error("configuration '{0}' declares no connection")]
    NoConnection(String),

    #[error("runtime instance '{0}' has been disposed")]
    Disposed(String),
}

impl InstanceError {
    /// Failure reason for this error
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Repository(e) => e.reason(),
            Self::Configuration { .. } | Self::Connection { .. } | Self::Validation { .. } => {
                FailureReason::ConnectionFailure
            }
            Self::NoConnection(_) => FailureReason::InvalidConfigReference,
            Self::Disposed(_) => FailureReason::SessionClosed,
        }
    }
}

impl From<InstanceError> for ResolutionFailure {
    fn from(error: InstanceError) -> Self {
        ResolutionFailure::from_error(error.reason(), &error)
    }
}

/// Errors from the instance cache
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("instance cache is closed")]
    Closed,

    #[error(transparent)]
    Construction(Arc<InstanceError>),
}

impl CacheError {
    /// Failure reason for this error
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Closed => FailureReason::SessionClosed,
            Self::Construction(e) => e.reason(),
        }
    }
}

impl From<CacheError> for ResolutionFailure {
    fn from(error: CacheError) -> Self {
        ResolutionFailure::from_error(error.reason(), &error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_failure_keeps_resolver_cause() {
        let error = CacheError::Construction(Arc::new(InstanceError::Connection {
            name: "client".into(),
            source: ResolverError::Connection("unreachable".into()),
        }));
        let failure = ResolutionFailure::from(error);
        assert_eq!(failure.reason, FailureReason::ConnectionFailure);
        assert_eq!(failure.message, "failed to connect 'client'");
        assert_eq!(failure.cause.as_deref(), Some("connection error: unreachable"));
    }

    #[test]
    fn repository_reasons_pass_through() {
        let error = InstanceError::from(RepositoryError::ConfigurationNotFound("x".into()));
        assert_eq!(error.reason(), FailureReason::InvalidConfigReference);
        assert_eq!(error.to_string(), "configuration 'x' not found");
        assert_eq!(CacheError::Closed.reason(), FailureReason::SessionClosed);
    }
}
