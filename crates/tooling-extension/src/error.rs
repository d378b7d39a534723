//! Error types for the extension layer

use tooling_declaration::{DeclarationError, ElementId};
use tooling_metadata::{FailureReason, ResolutionFailure};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by extension resolvers, factories and providers
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("missing acting parameter '{0}'")]
    MissingActingParameter(String),

    #[error("invalid metadata key: {0}")]
    InvalidKey(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("no metadata keys available")]
    NoKeys,

    #[error("resolution was interrupted")]
    Interrupted,

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },
}

impl ResolverError {
    /// Generic failure without a cause
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            cause: None,
        }
    }

    /// Generic failure wrapping the error that caused it
    #[must_use]
    pub fn caused_by(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Failure reason for this error
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::MissingActingParameter(_) => FailureReason::MissingActingParameter,
            Self::InvalidKey(_) => FailureReason::InvalidMetadataKey,
            Self::Connection(_) => FailureReason::ConnectionFailure,
            Self::NoKeys => FailureReason::NoDynamicKeysAvailable,
            Self::Interrupted | Self::Failed { .. } => FailureReason::Unknown,
        }
    }
}

impl From<ResolverError> for ResolutionFailure {
    fn from(error: ResolverError) -> Self {
        ResolutionFailure::from_error(error.reason(), &error)
    }
}

/// Errors resolving a declaration against the registered extensions
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(#[from] DeclarationError),

    #[error("component '{0}' not found")]
    ComponentNotFound(ElementId),

    #[error("configuration type '{0}' not found")]
    ConfigurationTypeNotFound(ElementId),

    #[error("connection type '{0}' not found")]
    ConnectionTypeNotFound(ElementId),

    #[error("configuration '{0}' not found")]
    ConfigurationNotFound(String),

    #[error("component '{component}' requires a configuration reference")]
    MissingConfigReference { component: ElementId },

    #[error("configuration '{name}' is incompatible: {reason}")]
    IncompatibleConfiguration { name: String, reason: String },

    #[error("configuration '{0}' declares no connection")]
    NoConnection(String),
}

impl RepositoryError {
    /// Failure reason for this error
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::ComponentNotFound(_)
            | Self::ConfigurationTypeNotFound(_)
            | Self::ConnectionTypeNotFound(_) => FailureReason::ComponentNotFound,
            Self::ConfigurationNotFound(_)
            | Self::MissingConfigReference { .. }
            | Self::IncompatibleConfiguration { .. }
            | Self::NoConnection(_) => FailureReason::InvalidConfigReference,
            Self::InvalidDeclaration(_) => FailureReason::Unknown,
        }
    }
}

impl From<RepositoryError> for ResolutionFailure {
    fn from(error: RepositoryError) -> Self {
        ResolutionFailure::from_error(error.reason(), &error)
    }
}

/// Errors building the extension registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("component '{id}' is registered by both '{first}' and '{second}'")]
    DuplicateComponent {
        id: ElementId,
        first: String,
        second: String,
    },

    #[error("extension '{0}' is registered twice")]
    DuplicateExtension(String),
}

/// Errors from the artifact/dependency collaborator
#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("dependency '{0}' could not be resolved")]
    NotFound(String),

    #[error("no extension model in '{0}'")]
    NotAnExtension(String),

    #[error("dependency resolution failed: {message}")]
    Failed {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("socket closed")]
    struct SocketClosed;

    #[test]
    fn resolver_error_reasons() {
        assert_eq!(
            ResolverError::MissingActingParameter("a".into()).reason(),
            FailureReason::MissingActingParameter
        );
        assert_eq!(ResolverError::NoKeys.reason(), FailureReason::NoDynamicKeysAvailable);
        assert_eq!(ResolverError::Interrupted.reason(), FailureReason::Unknown);
    }

    #[test]
    fn failure_carries_cause() {
        let failure: ResolutionFailure = ResolverError::caused_by("boom", SocketClosed).into();
        assert_eq!(failure.reason, FailureReason::Unknown);
        assert_eq!(failure.message, "boom");
        assert_eq!(failure.cause.as_deref(), Some("socket closed"));
    }

    #[test]
    fn repository_error_display() {
        let err = RepositoryError::ConfigurationNotFound("dummyConfig".into());
        assert_eq!(err.to_string(), "configuration 'dummyConfig' not found");
        assert_eq!(err.reason(), FailureReason::InvalidConfigReference);

        let err = RepositoryError::ComponentNotFound(ElementId::new("tooling", "missingOP"));
        assert_eq!(err.to_string(), "component 'tooling:missingOP' not found");
        assert_eq!(err.reason(), FailureReason::ComponentNotFound);
    }
}
